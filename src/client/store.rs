use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    client::{
        api::{ClientError, ProductApi, ProductSubmission},
        state::ProductsState,
    },
    constants::NOTICE_TTL,
    entities::product::{Product, ProductQuery},
};

/// Drives `ProductsState` from `ProductApi` calls.
///
/// The state lock is never held across an await; each call applies its
/// pending transition, releases the lock, awaits the API and then applies
/// the outcome. Raised notices are dismissed after `notice_ttl`.
pub struct ProductStore<A: ProductApi> {
    api: Arc<A>,
    state: Arc<Mutex<ProductsState>>,
    notice_ttl: Duration,
}

impl<A: ProductApi> Clone for ProductStore<A> {
    fn clone(&self) -> Self {
        ProductStore {
            api: self.api.clone(),
            state: self.state.clone(),
            notice_ttl: self.notice_ttl,
        }
    }
}

impl<A: ProductApi> ProductStore<A> {
    pub fn new(api: A) -> Self {
        ProductStore {
            api: Arc::new(api),
            state: Arc::new(Mutex::new(ProductsState::new())),
            notice_ttl: NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, notice_ttl: Duration) -> Self {
        self.notice_ttl = notice_ttl;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> ProductsState {
        self.state.lock().clone()
    }

    #[instrument(skip(self))]
    pub async fn fetch_products(&self, query: ProductQuery) -> Result<(), ClientError> {
        let ticket = self.state.lock().list_pending();

        match self.api.list(&query).await {
            Ok(items) => {
                self.state.lock().list_fulfilled(ticket, items);
                Ok(())
            }
            Err(e) => {
                if self.state.lock().list_rejected(ticket, e.to_string()) {
                    self.schedule_dismiss();
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_product(&self, id: Uuid) -> Result<Product, ClientError> {
        self.state.lock().fetch_one_pending();

        match self.api.fetch(&id).await {
            Ok(product) => {
                self.state.lock().fetch_one_fulfilled(product.clone());
                Ok(product)
            }
            Err(e) => {
                self.state.lock().fetch_one_rejected(e.to_string());
                self.schedule_dismiss();
                Err(e)
            }
        }
    }

    #[instrument(skip(self, submission))]
    pub async fn create_product(&self, submission: ProductSubmission) -> Result<Product, ClientError> {
        self.state.lock().mutation_pending();

        let result = self.api.create(submission).await;
        {
            let mut state = self.state.lock();
            match &result {
                Ok(product) => state.create_fulfilled(product.clone()),
                Err(e) => state.mutation_rejected(e.to_string()),
            }
        }
        self.schedule_dismiss();
        result
    }

    #[instrument(skip(self, submission))]
    pub async fn update_product(&self, id: Uuid, submission: ProductSubmission) -> Result<Product, ClientError> {
        self.state.lock().mutation_pending();

        let result = self.api.update(&id, submission).await;
        {
            let mut state = self.state.lock();
            match &result {
                Ok(product) => state.update_fulfilled(product.clone()),
                Err(e) => state.mutation_rejected(e.to_string()),
            }
        }
        self.schedule_dismiss();
        result
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        self.state.lock().delete_pending(id);

        let result = self.api.delete(&id).await;
        {
            let mut state = self.state.lock();
            match &result {
                Ok(()) => state.delete_fulfilled(id),
                Err(e) => state.mutation_rejected(e.to_string()),
            }
        }
        self.schedule_dismiss();
        result
    }

    pub fn select(&self, product: Product) {
        self.state.lock().select(product);
    }

    pub fn clear_selection(&self) {
        self.state.lock().clear_selection();
    }

    pub fn clear_status(&self) {
        self.state.lock().clear_status();
    }

    /// Clears the current notice after `notice_ttl` unless a newer one replaced it.
    pub fn schedule_dismiss(&self) -> Option<JoinHandle<()>> {
        let generation = {
            let state = self.state.lock();
            state.notice()?;
            state.notice_generation()
        };

        let state = self.state.clone();
        let ttl = self.notice_ttl;
        Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            state.lock().clear_status_if(generation);
        }))
    }
}
