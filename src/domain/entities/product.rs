use std::{borrow::Cow, fmt, str::FromStr};

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

// ───── Constants ──────────────────────────────────────────────────────
pub const MIN_TITLE_LENGTH: u64 = 1;

// ───── Status ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            _ => Err(new_validation_error(
                "invalid_status",
                "Status must be either 'active' or 'inactive'",
            )),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub date: DateTime<Utc>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProductStatus,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A validated record ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInsert {
    pub title: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub date: DateTime<Utc>,
    pub image: Option<String>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChanges {
    pub title: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub date: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Mutation fields as they arrive from a form, before any conversion.
///
/// This is the single rule set for product input: the API validates
/// multipart bodies with it and the client form model validates with it
/// before submitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductFields {
    #[validate(length(min = MIN_TITLE_LENGTH, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_status"))]
    pub status: String,

    #[validate(custom(function = "validate_date_text"))]
    pub date: Option<String>,
}

/// Multipart body of create and update requests. The image size limit is
/// enforced by the `MultipartFormConfig` installed with the routes.
#[derive(Debug, MultipartForm)]
pub struct ProductUpload {
    pub title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub status: Option<Text<String>>,
    pub date: Option<Text<String>>,
    pub image: Option<TempFile>,
}

impl ProductUpload {
    /// Splits the text fields from the attached file. Missing text fields
    /// become empty values so that required ones fail validation.
    pub fn into_parts(self) -> (ProductFields, Option<TempFile>) {
        let fields = ProductFields {
            title: self.title.map(Text::into_inner).unwrap_or_default(),
            description: self.description.map(Text::into_inner),
            status: self.status.map(Text::into_inner).unwrap_or_default(),
            date: self.date.map(Text::into_inner),
        };
        (fields, self.image)
    }
}

/// Query string accepted by the list endpoint. Blank values impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Store-level predicate built from a [`ProductQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub status: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(status) = &self.status {
            if product.status.as_str() != status {
                return false;
            }
        }
        if let Some(start) = self.start {
            if product.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if product.date > end {
                return false;
            }
        }
        true
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_status(status: &str) -> Result<(), ValidationError> {
    ProductStatus::from_str(status).map(|_| ())
}

pub fn validate_date_text(date: &str) -> Result<(), ValidationError> {
    if date.trim().is_empty() || parse_date_text(date).is_some() {
        Ok(())
    } else {
        Err(new_validation_error("invalid_date", "Date must be YYYY-MM-DD or an RFC 3339 timestamp"))
    }
}

/// Parses the date formats the form and API accept. A bare date means
/// midnight UTC of that day.
pub fn parse_date_text(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Upper filter bound. A bare date covers the whole day so that the bound
/// stays inclusive for records created during that day.
fn parse_end_bound(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(day) => day
            .and_hms_milli_opt(23, 59, 59, 999)
            .map(|naive| naive.and_utc()),
        Err(_) => parse_date_text(trimmed),
    }
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

fn single_field_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<ProductRow> for Product {
    type Error = String;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status = ProductStatus::from_str(&row.status)
            .map_err(|_| format!("Stored product {} has unknown status '{}'", row.id, row.status))?;

        Ok(Product {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            date: row.date,
            image: row.image,
        })
    }
}

impl ProductFields {
    pub fn new(title: impl Into<String>, status: ProductStatus) -> Self {
        ProductFields {
            title: title.into(),
            description: None,
            status: status.to_string(),
            date: None,
        }
    }

    fn parsed_status(&self) -> Result<ProductStatus, ValidationErrors> {
        ProductStatus::from_str(&self.status).map_err(|e| single_field_error("status", e))
    }

    fn parsed_date(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .and_then(parse_date_text)
    }

    /// Validates and converts into an insert, defaulting `date` to now.
    pub fn into_insert(self, image: Option<String>) -> Result<ProductInsert, ValidationErrors> {
        self.validate()?;
        let status = self.parsed_status()?;
        let date = self.parsed_date().unwrap_or_else(Utc::now);

        Ok(ProductInsert {
            title: self.title,
            description: self.description,
            status,
            date,
            image,
        })
    }

    /// Validates and converts into a partial update. An absent `date` or
    /// `image` keeps the stored value.
    pub fn into_changes(self, image: Option<String>) -> Result<ProductChanges, ValidationErrors> {
        self.validate()?;
        let status = self.parsed_status()?;
        let date = self.parsed_date();

        Ok(ProductChanges {
            title: self.title,
            description: self.description,
            status,
            date,
            image,
        })
    }
}

impl From<&Product> for ProductFields {
    fn from(product: &Product) -> Self {
        ProductFields {
            title: product.title.clone(),
            description: product.description.clone(),
            status: product.status.to_string(),
            date: Some(product.date.to_rfc3339()),
        }
    }
}

impl TryFrom<ProductQuery> for ProductFilter {
    type Error = ValidationErrors;

    fn try_from(query: ProductQuery) -> Result<Self, Self::Error> {
        let start = match non_blank(query.start_date) {
            Some(text) => Some(parse_date_text(&text).ok_or_else(|| {
                single_field_error("startDate", new_validation_error("invalid_date", "startDate is not a valid date"))
            })?),
            None => None,
        };

        let end = match non_blank(query.end_date) {
            Some(text) => Some(parse_end_bound(&text).ok_or_else(|| {
                single_field_error("endDate", new_validation_error("invalid_date", "endDate is not a valid date"))
            })?),
            None => None,
        };

        Ok(ProductFilter {
            status: non_blank(query.status),
            start,
            end,
        })
    }
}
