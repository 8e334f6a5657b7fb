pub mod media;
pub mod portfolio;
pub mod projects;
pub mod sections;
pub mod users;

use uuid::Uuid;

/// Children of the portfolio aggregate addressed by their server-assigned ID.
pub trait HasId {
    fn id(&self) -> Uuid;
}

/// Linear scan for a child by ID.
pub fn find_by_id<T: HasId>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

pub fn find_by_id_mut<T: HasId>(items: &mut [T], id: Uuid) -> Option<&mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Remove the child with the given ID, preserving the order of the rest.
/// Returns how many elements were removed (0 or 1 since IDs are unique).
pub fn remove_by_id<T: HasId>(items: &mut Vec<T>, id: Uuid) -> u64 {
    let before = items.len();
    items.retain(|item| item.id() != id);
    (before - items.len()) as u64
}
