/// Characters room codes are drawn from; `I`, `O`, `0` and `1` are left out.
pub const ROOM_ID_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const ROOM_ID_LEN: usize = 4;

pub fn is_valid_room_id(id: &str) -> bool {
    id.len() == ROOM_ID_LEN && id.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
}

/// Canonical form of a typed-in room code, `None` if it cannot be one.
pub fn normalize_room_id(input: &str) -> Option<String> {
    let id = input.trim().to_ascii_uppercase();
    is_valid_room_id(&id).then_some(id)
}

/// Builds a code from `ROOM_ID_LEN` alphabet indices; each index is taken modulo the alphabet size.
pub fn room_id_from_indices(indices: [u8; ROOM_ID_LEN]) -> String {
    indices
        .iter()
        .map(|&i| char::from(ROOM_ID_ALPHABET[usize::from(i) % ROOM_ID_ALPHABET.len()]))
        .collect()
}
