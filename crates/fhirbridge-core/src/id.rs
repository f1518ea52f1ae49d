/// Generate a fresh v4 UUID, used for bundle ids and new record ids.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
