use std::str::FromStr;

use uuid::Uuid;
use validator::Validate;

use crate::{
    client::{
        api::{ClientError, ImageUpload, ProductApi, ProductSubmission},
        state::ProductsState,
        store::ProductStore,
    },
    entities::product::{Product, ProductFields, ProductQuery, ProductStatus},
    errors::{field_errors, FieldError},
    uploads::{check_image, DEFAULT_MAX_IMAGE_BYTES},
};

pub const EMPTY_GRID_MESSAGE: &str = "No products found.";
pub const IMAGE_RULE_MESSAGE: &str = "Image must be .jpg, .jpeg, .png and <= 2MB";

// ───── Filter bar ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusChoice {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusChoice::All => "all",
            StatusChoice::Active => "active",
            StatusChoice::Inactive => "inactive",
        }
    }

    fn status(&self) -> Option<ProductStatus> {
        match self {
            StatusChoice::All => None,
            StatusChoice::Active => Some(ProductStatus::Active),
            StatusChoice::Inactive => Some(ProductStatus::Inactive),
        }
    }
}

impl FromStr for StatusChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusChoice::All),
            "active" => Ok(StatusChoice::Active),
            "inactive" => Ok(StatusChoice::Inactive),
            other => Err(format!("Unknown status choice: {}", other)),
        }
    }
}

/// Status select plus a start/end date pair. `All` and empty dates send nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBar {
    pub status: StatusChoice,
    pub start_date: String,
    pub end_date: String,
}

impl FilterBar {
    pub fn to_query(&self) -> ProductQuery {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());

        ProductQuery {
            status: self.status.status().map(|s| s.to_string()),
            start_date: non_empty(&self.start_date),
            end_date: non_empty(&self.end_date),
        }
    }

    pub fn reset(&mut self) {
        *self = FilterBar::default();
    }

    /// Issues a list request for the current filter.
    pub async fn apply<A: ProductApi>(&self, store: &ProductStore<A>) -> Result<(), ClientError> {
        store.fetch_products(self.to_query()).await
    }
}

// ───── Product form ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePreview {
    /// A newly picked file, not uploaded yet.
    Attached(String),
    /// The image already stored on the record being edited.
    Stored(String),
}

/// Editable copy of a product. With `editing` set, submitting updates that
/// record; otherwise it creates a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub status: ProductStatus,
    pub date: String,
    pub image: Option<ImageUpload>,
    editing: Option<Uuid>,
    stored_image: Option<String>,
    max_image_bytes: Option<usize>,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_selected(product: &Product) -> Self {
        let mut form = ProductForm::new();
        form.load(Some(product));
        form
    }

    /// Mirrors the selection: fills from `selected` or resets to defaults.
    ///
    /// `date` keeps only the calendar day, so submitting an edit stores the
    /// record at midnight UTC of that day even if only another field changed.
    pub fn load(&mut self, selected: Option<&Product>) {
        let max_image_bytes = self.max_image_bytes;
        *self = match selected {
            Some(product) => ProductForm {
                title: product.title.clone(),
                description: product.description.clone().unwrap_or_default(),
                status: product.status,
                date: product.date.format("%Y-%m-%d").to_string(),
                image: None,
                editing: Some(product.id),
                stored_image: product.image.clone(),
                max_image_bytes,
            },
            None => ProductForm { max_image_bytes, ..ProductForm::default() },
        };
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = Some(max_image_bytes);
        self
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() { "Update Product" } else { "Add Product" }
    }

    pub fn preview(&self) -> Option<ImagePreview> {
        match (&self.image, &self.stored_image) {
            (Some(image), _) => Some(ImagePreview::Attached(image.file_name.clone())),
            (None, Some(stored)) => Some(ImagePreview::Stored(stored.clone())),
            (None, None) => None,
        }
    }

    pub fn reset(&mut self) {
        self.load(None);
    }

    /// Same field rules the API applies, plus the image extension and size check.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let fields = ProductFields {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            status: self.status.to_string(),
            date: (!self.date.trim().is_empty()).then(|| self.date.clone()),
        };

        let mut errors = match fields.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if let Some(image) = &self.image {
            let max = self.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
            if check_image(Some(image.file_name.as_str()), image.size(), max).is_err() {
                errors.push(FieldError::new("image", IMAGE_RULE_MESSAGE));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn to_submission(&self) -> ProductSubmission {
        ProductSubmission {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            date: (!self.date.trim().is_empty()).then(|| self.date.clone()),
            image: self.image.clone(),
        }
    }

    /// Validates, then creates or updates. On success the form resets and,
    /// for an update, the selection is cleared.
    pub async fn submit<A: ProductApi>(&mut self, store: &ProductStore<A>) -> Result<Product, ClientError> {
        self.validate().map_err(ClientError::Invalid)?;

        let product = match self.editing {
            Some(id) => {
                let product = store.update_product(id, self.to_submission()).await?;
                store.clear_selection();
                product
            }
            None => store.create_product(self.to_submission()).await?,
        };

        self.reset();
        Ok(product)
    }

    /// Abandons an edit without submitting.
    pub fn cancel<A: ProductApi>(&mut self, store: &ProductStore<A>) {
        self.reset();
        store.clear_selection();
    }
}

// ───── Grid ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProductStatus,
    pub date_label: String,
    pub image_url: Option<String>,
    /// Edit and delete controls, present only in [`GridMode::Manage`].
    pub actions: Option<CardActions>,
}

/// `Browse` shows plain cards; `Manage` adds edit and delete controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridMode {
    #[default]
    Browse,
    Manage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardActions {
    /// This card's delete request is in flight.
    pub deleting: bool,
}

impl CardActions {
    pub fn can_delete(&self) -> bool {
        !self.deleting
    }
}

impl ProductCard {
    pub fn new(product: &Product, api_base: &str) -> Self {
        ProductCard {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone().unwrap_or_default(),
            status: product.status,
            date_label: product.date.format("%b %-d, %Y").to_string(),
            image_url: product.image.as_deref().map(|image| resolve_image_url(image, api_base)),
            actions: None,
        }
    }

    fn with_actions(mut self, deleting: bool) -> Self {
        self.actions = Some(CardActions { deleting });
        self
    }

    pub fn badge(&self) -> &'static str {
        self.status.as_str()
    }
}

/// Stored image refs are relative to the API; absolute URLs pass through.
pub fn resolve_image_url(image: &str, api_base: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!("{}/{}", api_base.trim_end_matches('/'), image.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridView {
    Loading,
    Error(String),
    Empty,
    Cards(Vec<ProductCard>),
}

impl GridView {
    pub fn from_state(state: &ProductsState, api_base: &str) -> Self {
        Self::from_state_in(state, api_base, GridMode::Browse)
    }

    pub fn from_state_in(state: &ProductsState, api_base: &str, mode: GridMode) -> Self {
        if state.loading {
            GridView::Loading
        } else if let Some(error) = &state.error {
            GridView::Error(error.clone())
        } else if state.items.is_empty() {
            GridView::Empty
        } else {
            let cards = state.items.iter().map(|product| {
                let card = ProductCard::new(product, api_base);
                match mode {
                    GridMode::Browse => card,
                    GridMode::Manage => card.with_actions(state.deleting == Some(product.id)),
                }
            });
            GridView::Cards(cards.collect())
        }
    }

    /// Edit action: hands the record to the form through the selection.
    pub fn edit<A: ProductApi>(store: &ProductStore<A>, product: &Product) {
        store.select(product.clone());
    }

    /// Delete action; a card already being deleted ignores repeat clicks.
    pub async fn delete<A: ProductApi>(store: &ProductStore<A>, id: Uuid) -> Result<(), ClientError> {
        if store.state().deleting == Some(id) {
            return Ok(());
        }
        store.delete_product(id).await
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            GridView::Loading => Some("Loading..."),
            GridView::Error(error) => Some(error),
            GridView::Empty => Some(EMPTY_GRID_MESSAGE),
            GridView::Cards(_) => None,
        }
    }
}
