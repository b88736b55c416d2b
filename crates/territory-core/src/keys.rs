//! Key and member naming for the indices in spec.md §3 "Indices and
//! ownership". Centralized so a renamed index shows up in one place.

pub fn tile_key(q: i32, r: i32) -> String {
    format!("tile:{}:{}", q, r)
}

pub fn coord_member(q: i32, r: i32) -> String {
    format!("{}:{}", q, r)
}

pub fn parse_coord_member(member: &str) -> Option<(i32, i32)> {
    let (q, r) = member.split_once(':')?;
    Some((q.parse().ok()?, r.parse().ok()?))
}

pub fn tiles_index() -> &'static str {
    "tiles:index"
}

pub fn chunk_tiles_key(cq: i32, cr: i32) -> String {
    format!("chunk:{}:{}:tiles", cq, cr)
}

pub fn owner_tiles_key(user_id: &str) -> String {
    format!("owner:{}:tiles", user_id)
}

pub fn poi_index() -> &'static str {
    "poi:index"
}

pub fn leaderboard_key() -> &'static str {
    "leaderboard:tiles"
}

pub fn chunk_activity_key() -> &'static str {
    "chunk:activity"
}

pub fn chunk_activity_field(cq: i32, cr: i32) -> String {
    format!("{}:{}", cq, cr)
}

pub fn player_key(user_id: &str) -> String {
    format!("player:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_member_round_trips() {
        assert_eq!(parse_coord_member(&coord_member(-3, 7)), Some((-3, 7)));
    }

    #[test]
    fn parse_coord_member_rejects_garbage() {
        assert_eq!(parse_coord_member("nope"), None);
        assert_eq!(parse_coord_member("1:2:3"), None);
    }
}
