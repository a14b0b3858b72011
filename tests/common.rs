#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use image::{ImageFormat, RgbImage};
use parking_lot::Mutex;
use sqlx::types::Json;
use uuid::Uuid;

use lekhak_server::auth::jwt::{encode_token, AppMetadata, SupabaseClaims, UserMetadata};
use lekhak_server::auth::{Profile, ProfileStore, User};
use lekhak_server::db::StoreError;
use lekhak_server::documents::{Document, DocumentStore, DocumentUpdate, NewDocument};
use lekhak_server::pdf::{Bitmap, PdfError, RasterOptions, Rasterizer};
use lekhak_server::templates::TemplateRegistry;
use lekhak_server::{AppConfig, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// In-memory `documents` and `template_usage` tables.
#[derive(Default)]
pub struct MemoryDocumentStore {
    pub documents: Mutex<Vec<Document>>,
    pub usage: Mutex<Vec<(Uuid, String)>>,
    /// Behave as if the tables were never created.
    pub missing_tables: bool,
}

impl MemoryDocumentStore {
    pub fn without_tables() -> Self {
        Self {
            missing_tables: true,
            ..Default::default()
        }
    }

    fn check_tables(&self) -> Result<(), StoreError> {
        if self.missing_tables {
            Err(StoreError::SetupRequired)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, user_id: Uuid, document: NewDocument) -> Result<Document, StoreError> {
        self.check_tables()?;
        let now = Utc::now();
        let row = Document {
            id: Uuid::new_v4(),
            user_id,
            template_id: document.template_id,
            title: document.title,
            form_data: Json(document.form_data),
            language: document.language.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.documents.lock().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, StoreError> {
        self.check_tables()?;
        let mut rows: Vec<Document> = self
            .documents
            .lock()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.check_tables()?;
        Ok(self
            .documents
            .lock()
            .iter()
            .find(|d| d.id == id && d.user_id == user_id)
            .cloned())
    }

    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError> {
        self.check_tables()?;
        let mut documents = self.documents.lock();
        let document = documents
            .iter_mut()
            .find(|d| d.id == id && d.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        update.apply(document);
        Ok(document.clone())
    }

    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        self.check_tables()?;
        let mut documents = self.documents.lock();
        let before = documents.len();
        documents.retain(|d| !(d.id == id && d.user_id == user_id));
        Ok(documents.len() < before)
    }

    async fn record_template_usage(&self, user_id: Uuid, template_id: &str) -> Result<(), StoreError> {
        self.check_tables()?;
        self.usage.lock().push((user_id, template_id.to_string()));
        Ok(())
    }

    async fn template_usage_counts(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        self.check_tables()?;
        let mut counts = BTreeMap::new();
        for (_, template_id) in self.usage.lock().iter() {
            *counts.entry(template_id.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    pub profiles: Mutex<Vec<Profile>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.lock().iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, user: &User) -> Result<Profile, StoreError> {
        let profile = Profile {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar.clone(),
            provider: user.provider.as_str().to_string(),
            created_at: Some(Utc::now()),
        };
        self.profiles.lock().push(profile.clone());
        Ok(profile)
    }
}

/// Produces a white bitmap of a fixed size and counts its calls.
pub struct FakeRasterizer {
    pub width: u32,
    pub height: u32,
    pub calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn rasterize(&self, _html: &str, _options: &RasterOptions) -> Result<Bitmap, PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut png = Vec::new();
        RgbImage::from_pixel(self.width, self.height, image::Rgb([255, 255, 255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfError::Image(e.to_string()))?;
        Bitmap::from_png(png)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "SUPABASE_DATABASE_URL" => Some("postgres://unused/test".to_string()),
        "SUPABASE_JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub documents: Arc<MemoryDocumentStore>,
    pub profiles: Arc<MemoryProfileStore>,
    pub rasterizer: Arc<FakeRasterizer>,
}

pub fn context_with(documents: MemoryDocumentStore) -> TestContext {
    let documents = Arc::new(documents);
    let profiles = Arc::new(MemoryProfileStore::default());
    // 210px wide, so one pixel is one millimetre on A4.
    let rasterizer = Arc::new(FakeRasterizer::new(210, 400));
    let state = AppState::from_parts(
        test_config(),
        TemplateRegistry::builtin().expect("built-in templates"),
        documents.clone(),
        profiles.clone(),
        rasterizer.clone(),
    );
    TestContext {
        state: web::Data::new(state),
        documents,
        profiles,
        rasterizer,
    }
}

pub fn context() -> TestContext {
    context_with(MemoryDocumentStore::default())
}

/// A signed access token for a fresh user id.
pub fn token_for(user_id: Uuid, email: &str, full_name: Option<&str>) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = SupabaseClaims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        exp: now + 3600,
        iat: now,
        aud: Some("authenticated".to_string()),
        role: Some("authenticated".to_string()),
        user_metadata: UserMetadata {
            full_name: full_name.map(str::to_string),
            ..Default::default()
        },
        app_metadata: AppMetadata {
            provider: Some("email".to_string()),
        },
    };
    encode_token(&claims, TEST_SECRET).expect("token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Every required field of the leave application, filled in.
pub fn complete_leave_form() -> serde_json::Value {
    serde_json::json!({
        "applicantName": "Sita Sharma",
        "position": "Accountant",
        "officeName": "District Office",
        "officeHead": "Chief Officer",
        "leaveReason": "<p>Family <b>wedding</b></p>",
        "startDate": "2024-05-01",
        "endDate": "2024-05-05",
        "applicationDate": "2024-04-20"
    })
}
