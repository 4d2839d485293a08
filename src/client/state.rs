use uuid::Uuid;

use crate::entities::product::Product;

pub const CREATED_MESSAGE: &str = "Product created successfully!";
pub const UPDATED_MESSAGE: &str = "Product updated successfully!";
pub const DELETED_MESSAGE: &str = "Product deleted successfully!";

/// Identifies one issued list request. Only the latest ticket may write `items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTicket(u64);

/// The transient message currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Client cache of the product catalog.
///
/// Transitions follow a pending / fulfilled / rejected shape per operation.
/// Every pending transition clears both `error` and `success`, so at most one
/// of them describes the last completed operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductsState {
    pub items: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub selected: Option<Product>,
    /// Record whose delete request is in flight.
    pub deleting: Option<Uuid>,
    list_seq: u64,
    notice_gen: u64,
}

impl ProductsState {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = None;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.notice_gen += 1;
    }

    fn succeed(&mut self, message: &str) {
        self.loading = false;
        self.success = Some(message.to_string());
        self.notice_gen += 1;
    }

    pub fn list_pending(&mut self) -> ListTicket {
        self.begin();
        self.list_seq += 1;
        ListTicket(self.list_seq)
    }

    /// Replaces `items` wholesale. Returns false when a newer list request
    /// was issued after `ticket`, in which case the response is dropped.
    pub fn list_fulfilled(&mut self, ticket: ListTicket, items: Vec<Product>) -> bool {
        if !self.is_latest(ticket) {
            tracing::debug!(ticket = ticket.0, latest = self.list_seq, "Dropping stale list response");
            return false;
        }
        self.loading = false;
        self.items = items;
        true
    }

    pub fn list_rejected(&mut self, ticket: ListTicket, message: impl Into<String>) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.fail(message.into());
        true
    }

    pub fn is_latest(&self, ticket: ListTicket) -> bool {
        ticket.0 == self.list_seq
    }

    pub fn fetch_one_pending(&mut self) {
        self.begin();
    }

    pub fn fetch_one_fulfilled(&mut self, product: Product) {
        self.loading = false;
        self.selected = Some(product);
    }

    pub fn fetch_one_rejected(&mut self, message: impl Into<String>) {
        self.fail(message.into());
    }

    /// Shared pending step of create, update and delete.
    pub fn mutation_pending(&mut self) {
        self.begin();
    }

    pub fn create_fulfilled(&mut self, product: Product) {
        self.items.insert(0, product);
        self.succeed(CREATED_MESSAGE);
    }

    pub fn update_fulfilled(&mut self, product: Product) {
        if let Some(slot) = self.items.iter_mut().find(|item| item.id == product.id) {
            *slot = product;
        }
        self.succeed(UPDATED_MESSAGE);
    }

    pub fn delete_pending(&mut self, id: Uuid) {
        self.begin();
        self.deleting = Some(id);
    }

    pub fn delete_fulfilled(&mut self, id: Uuid) {
        self.deleting = None;
        self.items.retain(|item| item.id != id);
        self.succeed(DELETED_MESSAGE);
    }

    /// Leaves `items` untouched.
    pub fn mutation_rejected(&mut self, message: impl Into<String>) {
        self.deleting = None;
        self.fail(message.into());
    }

    pub fn select(&mut self, product: Product) {
        self.selected = Some(product);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear_status(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn notice(&self) -> Option<Notice> {
        match (&self.error, &self.success) {
            (Some(error), _) => Some(Notice::Error(error.clone())),
            (None, Some(success)) => Some(Notice::Success(success.clone())),
            (None, None) => None,
        }
    }

    /// Bumped every time a new notice is raised.
    pub fn notice_generation(&self) -> u64 {
        self.notice_gen
    }

    /// Clears the notice only if no newer one was raised since `generation`.
    pub fn clear_status_if(&mut self, generation: u64) -> bool {
        if self.notice_gen != generation {
            return false;
        }
        self.clear_status();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::ProductStatus;
    use chrono::{TimeZone, Utc};

    fn product(title: &str, status: ProductStatus) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            status,
            date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            image: None,
        }
    }

    #[test]
    fn list_pending_clears_previous_notices() {
        let mut state = ProductsState::new();
        state.mutation_pending();
        state.mutation_rejected("boom");
        state.success = Some("old".into());

        state.list_pending();

        assert!(state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.success, None);
    }

    #[test]
    fn stale_list_response_is_discarded() {
        let mut state = ProductsState::new();
        let first = state.list_pending();
        let second = state.list_pending();

        assert!(state.list_fulfilled(second, vec![product("New", ProductStatus::Active)]));
        assert!(!state.list_fulfilled(first, vec![]));

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].title, "New");
        assert!(!state.loading);
    }

    #[test]
    fn stale_list_failure_does_not_raise_an_error() {
        let mut state = ProductsState::new();
        let first = state.list_pending();
        let second = state.list_pending();

        assert!(!state.list_rejected(first, "timeout"));
        assert!(state.loading);
        assert_eq!(state.error, None);

        assert!(state.list_fulfilled(second, vec![]));
    }

    #[test]
    fn rejected_list_keeps_items() {
        let mut state = ProductsState::new();
        let ticket = state.list_pending();
        state.list_fulfilled(ticket, vec![product("Lamp", ProductStatus::Active)]);

        let ticket = state.list_pending();
        state.list_rejected(ticket, "Network Error");

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Network Error"));
        assert!(!state.loading);
    }

    #[test]
    fn create_prepends_and_reports_success() {
        let mut state = ProductsState::new();
        state.items = vec![product("Old", ProductStatus::Active)];

        state.mutation_pending();
        state.create_fulfilled(product("Lamp", ProductStatus::Active));

        assert_eq!(state.items[0].title, "Lamp");
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.notice(), Some(Notice::Success(CREATED_MESSAGE.to_string())));
        assert_eq!(state.error, None);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut state = ProductsState::new();
        let first = product("First", ProductStatus::Active);
        let second = product("Second", ProductStatus::Active);
        state.items = vec![first.clone(), second.clone()];

        let mut changed = first.clone();
        changed.status = ProductStatus::Inactive;
        state.mutation_pending();
        state.update_fulfilled(changed);

        assert_eq!(state.items[0].id, first.id);
        assert_eq!(state.items[0].status, ProductStatus::Inactive);
        assert_eq!(state.items[1], second);
        assert_eq!(state.success.as_deref(), Some(UPDATED_MESSAGE));
    }

    #[test]
    fn delete_removes_matching_item() {
        let mut state = ProductsState::new();
        let keep = product("Keep", ProductStatus::Active);
        let drop = product("Drop", ProductStatus::Inactive);
        state.items = vec![keep.clone(), drop.clone()];

        state.mutation_pending();
        state.delete_fulfilled(drop.id);

        assert_eq!(state.items, vec![keep]);
        assert_eq!(state.success.as_deref(), Some(DELETED_MESSAGE));
    }

    #[test]
    fn deleting_marker_tracks_the_request() {
        let mut state = ProductsState::new();
        let lamp = product("Lamp", ProductStatus::Active);
        let chair = product("Chair", ProductStatus::Active);
        state.items = vec![lamp.clone(), chair.clone()];

        state.delete_pending(lamp.id);
        assert_eq!(state.deleting, Some(lamp.id));
        state.mutation_rejected("Not found");
        assert_eq!(state.deleting, None);
        assert_eq!(state.items.len(), 2);

        state.delete_pending(chair.id);
        state.delete_fulfilled(chair.id);
        assert_eq!(state.deleting, None);
        assert_eq!(state.items, vec![lamp]);
    }

    #[test]
    fn rejected_mutation_leaves_items_unchanged() {
        let mut state = ProductsState::new();
        state.items = vec![product("Lamp", ProductStatus::Active)];
        let before = state.items.clone();

        state.mutation_pending();
        state.mutation_rejected("Validation failed");

        assert_eq!(state.items, before);
        assert_eq!(state.notice(), Some(Notice::Error("Validation failed".to_string())));
        assert_eq!(state.success, None);
    }

    #[test]
    fn fetch_one_loads_selection() {
        let mut state = ProductsState::new();
        let lamp = product("Lamp", ProductStatus::Active);

        state.fetch_one_pending();
        state.fetch_one_fulfilled(lamp.clone());

        assert_eq!(state.selected, Some(lamp));
        assert!(!state.loading);
    }

    #[test]
    fn select_and_clear_selection() {
        let mut state = ProductsState::new();
        let lamp = product("Lamp", ProductStatus::Active);

        state.select(lamp.clone());
        assert_eq!(state.selected.as_ref(), Some(&lamp));

        state.clear_selection();
        assert_eq!(state.selected, None);
    }

    #[test]
    fn older_dismiss_timer_does_not_clear_newer_notice() {
        let mut state = ProductsState::new();
        state.mutation_pending();
        state.create_fulfilled(product("Lamp", ProductStatus::Active));
        let first_gen = state.notice_generation();

        state.mutation_pending();
        state.mutation_rejected("Not found");

        assert!(!state.clear_status_if(first_gen));
        assert_eq!(state.error.as_deref(), Some("Not found"));

        assert!(state.clear_status_if(state.notice_generation()));
        assert_eq!(state.notice(), None);
    }
}
