//! Unique indexes the rep2recall backend relies on.
//!
//! - `user { email: "text" }` - one account per email
//! - `deck { userId: 1, name: 1 }` - deck names unique per owner
//! - `card { userId: 1, front: 1 }` - card fronts unique per owner
//! - `media { sourceId: 1, h: 1 }` - media deduplicated by content hash
//!
//! `createIndexes` is idempotent on the server: re-declaring an identical
//! index is a no-op, a different definition under the same name fails with
//! `IndexOptionsConflict`/`IndexKeySpecsConflict`. Nothing here catches that.

use super::MongoDB;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

/// Server error code for a collection that does not exist yet.
const NAMESPACE_NOT_FOUND: i32 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Ascending,
    Text,
}

impl KeyKind {
    fn value(self) -> Bson {
        match self {
            KeyKind::Ascending => Bson::Int32(1),
            KeyKind::Text => Bson::String("text".to_string()),
        }
    }

    fn name_suffix(self) -> &'static str {
        match self {
            KeyKind::Ascending => "1",
            KeyKind::Text => "text",
        }
    }
}

/// One declared index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: &'static [(&'static str, KeyKind)],
    pub unique: bool,
}

/// Declared indexes, in the order they are created.
pub static INDEX_SPECS: [IndexSpec; 4] = [
    IndexSpec {
        collection: "user",
        keys: &[("email", KeyKind::Text)],
        unique: true,
    },
    IndexSpec {
        collection: "deck",
        keys: &[("userId", KeyKind::Ascending), ("name", KeyKind::Ascending)],
        unique: true,
    },
    IndexSpec {
        collection: "card",
        keys: &[("userId", KeyKind::Ascending), ("front", KeyKind::Ascending)],
        unique: true,
    },
    IndexSpec {
        collection: "media",
        keys: &[("sourceId", KeyKind::Ascending), ("h", KeyKind::Ascending)],
        unique: true,
    },
];

impl IndexSpec {
    pub fn keys_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, kind) in self.keys {
            keys.insert(*field, kind.value());
        }
        keys
    }

    /// Same name the server would generate, e.g. `userId_1_name_1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, kind)| format!("{}_{}", field, kind.name_suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn to_model(&self) -> IndexModel {
        IndexModel::builder()
            .keys(self.keys_document())
            .options(
                IndexOptions::builder()
                    .name(self.name())
                    .unique(self.unique)
                    .build(),
            )
            .build()
    }

    /// `user(email text, unique)`
    pub fn describe(&self) -> String {
        let fields = self
            .keys
            .iter()
            .map(|(field, kind)| match kind {
                KeyKind::Ascending => field.to_string(),
                KeyKind::Text => format!("{field} text"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let unique = if self.unique { ", unique" } else { "" };
        format!("{}({}{})", self.collection, fields, unique)
    }

    fn has_text_keys(&self) -> bool {
        self.keys.iter().any(|(_, kind)| *kind == KeyKind::Text)
    }

    /// Whether an index reported by `listIndexes` has exactly this key
    /// pattern and uniqueness.
    pub fn matches(&self, existing: &IndexModel) -> bool {
        let options = existing.options.as_ref();
        let unique = options.and_then(|o| o.unique).unwrap_or(false);
        if unique != self.unique {
            return false;
        }

        if self.has_text_keys() {
            let weights = options.and_then(|o| o.weights.as_ref());
            self.matches_text_keys(&existing.keys, weights)
        } else {
            same_ascending_keys(&self.keys_document(), &existing.keys)
        }
    }

    // Text indexes come back as `{ _fts: "text", _ftsx: 1 }` plus any
    // scalar prefix fields, with the indexed fields listed in `weights`.
    fn matches_text_keys(&self, keys: &Document, weights: Option<&Document>) -> bool {
        if keys.get_str("_fts").ok() != Some("text") {
            return false;
        }

        let scalar_declared = self
            .keys
            .iter()
            .filter(|(_, kind)| *kind == KeyKind::Ascending)
            .map(|(field, _)| *field);
        let scalar_found = keys
            .keys()
            .filter(|k| k.as_str() != "_fts" && k.as_str() != "_ftsx")
            .map(String::as_str);
        if !scalar_declared.eq(scalar_found) {
            return false;
        }

        let Some(weights) = weights else {
            return false;
        };
        let mut text_declared: Vec<&str> = self
            .keys
            .iter()
            .filter(|(_, kind)| *kind == KeyKind::Text)
            .map(|(field, _)| *field)
            .collect();
        let mut text_found: Vec<&str> = weights.keys().map(String::as_str).collect();
        text_declared.sort_unstable();
        text_found.sort_unstable();
        text_declared == text_found
    }

    /// Classify this declared index against the indexes already on its collection.
    pub fn status_in(&self, existing: &[IndexModel]) -> IndexStatus {
        let name = self.name();
        let same_name = existing.iter().find(|model| {
            model.options.as_ref().and_then(|o| o.name.as_deref()) == Some(name.as_str())
        });

        match same_name {
            Some(model) if self.matches(model) => IndexStatus::Present,
            Some(model) => IndexStatus::Mismatch {
                keys: model.keys.clone(),
                unique: model
                    .options
                    .as_ref()
                    .and_then(|o| o.unique)
                    .unwrap_or(false),
            },
            None if existing.iter().any(|model| self.matches(model)) => IndexStatus::Present,
            None => IndexStatus::Missing,
        }
    }
}

// Key order matters; direction may come back as any numeric type.
fn same_ascending_keys(declared: &Document, found: &Document) -> bool {
    declared.len() == found.len()
        && declared
            .iter()
            .zip(found.iter())
            .all(|((dk, dv), (fk, fv))| dk == fk && direction(dv) == direction(fv))
}

fn direction(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexStatus {
    Present,
    Missing,
    /// An index with the declared name exists with a different definition.
    Mismatch { keys: Document, unique: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub spec: &'static IndexSpec,
    pub status: IndexStatus,
}

impl IndexReport {
    pub fn is_present(&self) -> bool {
        self.status == IndexStatus::Present
    }
}

/// Create every declared index, one after the other. The first failure is
/// returned and the remaining indexes are not attempted.
pub async fn ensure_indexes(db: &MongoDB) -> mongodb::error::Result<Vec<String>> {
    log::info!("🔧 Creating database indexes...");

    let mut names = Vec::with_capacity(INDEX_SPECS.len());
    for spec in INDEX_SPECS.iter() {
        let collection = db.collection::<Document>(spec.collection);
        let result = collection.create_index(spec.to_model()).await?;

        log::info!("   ✅ Index ready: {} -> {}", spec.describe(), result.index_name);
        names.push(result.index_name);
    }

    log::info!("✅ Database indexes ready");
    Ok(names)
}

/// Compare the indexes on the server with [`INDEX_SPECS`]. Read-only.
pub async fn check_indexes(db: &MongoDB) -> mongodb::error::Result<Vec<IndexReport>> {
    let mut reports = Vec::with_capacity(INDEX_SPECS.len());
    for spec in INDEX_SPECS.iter() {
        let existing = list_existing(&db.collection::<Document>(spec.collection)).await?;
        log::debug!(
            "🔍 {} has {} index(es) on the server",
            spec.collection,
            existing.len()
        );

        reports.push(IndexReport {
            spec,
            status: spec.status_in(&existing),
        });
    }
    Ok(reports)
}

async fn list_existing(collection: &Collection<Document>) -> mongodb::error::Result<Vec<IndexModel>> {
    match collection.list_indexes().await {
        Ok(cursor) => cursor.try_collect().await,
        Err(err) if is_namespace_not_found(&err) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

fn is_namespace_not_found(err: &mongodb::error::Error) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(command) if command.code == NAMESPACE_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::scratch_db;
    use mongodb::bson::doc;

    fn model(keys: Document, options: IndexOptions) -> IndexModel {
        IndexModel::builder().keys(keys).options(options).build()
    }

    fn spec_for(collection: &str) -> &'static IndexSpec {
        INDEX_SPECS
            .iter()
            .find(|spec| spec.collection == collection)
            .unwrap()
    }

    #[test]
    fn test_index_order() {
        let collections: Vec<_> = INDEX_SPECS.iter().map(|spec| spec.collection).collect();
        assert_eq!(collections, vec!["user", "deck", "card", "media"]);
        assert!(INDEX_SPECS.iter().all(|spec| spec.unique));
    }

    #[test]
    fn test_keys_document() {
        assert_eq!(spec_for("user").keys_document(), doc! { "email": "text" });
        assert_eq!(spec_for("deck").keys_document(), doc! { "userId": 1, "name": 1 });
        assert_eq!(spec_for("card").keys_document(), doc! { "userId": 1, "front": 1 });
        assert_eq!(spec_for("media").keys_document(), doc! { "sourceId": 1, "h": 1 });
    }

    #[test]
    fn test_index_names() {
        let names: Vec<_> = INDEX_SPECS.iter().map(IndexSpec::name).collect();
        assert_eq!(
            names,
            vec!["email_text", "userId_1_name_1", "userId_1_front_1", "sourceId_1_h_1"]
        );
    }

    #[test]
    fn test_to_model() {
        let model = spec_for("deck").to_model();
        let options = model.options.unwrap();

        assert_eq!(model.keys, doc! { "userId": 1, "name": 1 });
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.name.as_deref(), Some("userId_1_name_1"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(spec_for("user").describe(), "user(email text, unique)");
        assert_eq!(spec_for("media").describe(), "media(sourceId, h, unique)");
    }

    #[test]
    fn test_matches_compound_index() {
        let spec = spec_for("card");
        let unique = || IndexOptions::builder().unique(true).build();

        assert!(spec.matches(&model(doc! { "userId": 1, "front": 1 }, unique())));
        assert!(spec.matches(&model(doc! { "userId": 1_i64, "front": 1.0 }, unique())));
        assert!(!spec.matches(&model(doc! { "front": 1, "userId": 1 }, unique())));
        assert!(!spec.matches(&model(doc! { "userId": 1, "front": -1 }, unique())));
        assert!(!spec.matches(&model(doc! { "userId": 1 }, unique())));
        assert!(!spec.matches(&model(
            doc! { "userId": 1, "front": 1 },
            IndexOptions::builder().build()
        )));
    }

    #[test]
    fn test_matches_text_index() {
        let spec = spec_for("user");
        let stored_keys = || doc! { "_fts": "text", "_ftsx": 1 };

        let found = model(
            stored_keys(),
            IndexOptions::builder()
                .unique(true)
                .weights(doc! { "email": 1 })
                .build(),
        );
        assert!(spec.matches(&found));

        let other_field = model(
            stored_keys(),
            IndexOptions::builder()
                .unique(true)
                .weights(doc! { "secret": 1 })
                .build(),
        );
        assert!(!spec.matches(&other_field));

        let not_unique = model(
            stored_keys(),
            IndexOptions::builder().weights(doc! { "email": 1 }).build(),
        );
        assert!(!spec.matches(&not_unique));

        let ascending = model(
            doc! { "email": 1 },
            IndexOptions::builder().unique(true).build(),
        );
        assert!(!spec.matches(&ascending));
    }

    #[test]
    fn test_status_in() {
        let spec = spec_for("deck");
        let id_index = model(
            doc! { "_id": 1 },
            IndexOptions::builder().name("_id_".to_string()).build(),
        );

        assert_eq!(spec.status_in(&[]), IndexStatus::Missing);
        assert_eq!(spec.status_in(&[id_index.clone()]), IndexStatus::Missing);

        let declared = spec.to_model();
        assert_eq!(
            spec.status_in(&[id_index.clone(), declared]),
            IndexStatus::Present
        );

        let renamed = model(
            doc! { "userId": 1, "name": 1 },
            IndexOptions::builder()
                .name("deck_owner_name".to_string())
                .unique(true)
                .build(),
        );
        assert_eq!(spec.status_in(&[renamed]), IndexStatus::Present);

        let not_unique = model(
            doc! { "userId": 1, "name": 1 },
            IndexOptions::builder()
                .name("userId_1_name_1".to_string())
                .build(),
        );
        assert_eq!(
            spec.status_in(&[id_index, not_unique]),
            IndexStatus::Mismatch {
                keys: doc! { "userId": 1, "name": 1 },
                unique: false,
            }
        );
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_ensure_indexes_creates_all() {
        let db = scratch_db().await;

        let names = ensure_indexes(&db).await.unwrap();
        assert_eq!(names.len(), 4);

        let reports = check_indexes(&db).await.unwrap();
        assert!(reports.iter().all(IndexReport::is_present), "{reports:?}");

        db.database().drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_ensure_indexes_is_idempotent() {
        let db = scratch_db().await;

        let first = ensure_indexes(&db).await.unwrap();
        let second = ensure_indexes(&db).await.unwrap();
        assert_eq!(first, second);

        for spec in INDEX_SPECS.iter() {
            let existing = list_existing(&db.collection::<Document>(spec.collection))
                .await
                .unwrap();
            // `_id_` plus the declared index
            assert_eq!(existing.len(), 2, "{}", spec.collection);
        }

        db.database().drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_conflicting_email_index_fails() {
        let db = scratch_db().await;

        let loose = model(
            doc! { "email": "text" },
            IndexOptions::builder().name("email_text".to_string()).build(),
        );
        db.collection::<Document>("user")
            .create_index(loose)
            .await
            .unwrap();

        assert!(ensure_indexes(&db).await.is_err());

        // The first failure stops the run.
        let reports = check_indexes(&db).await.unwrap();
        assert!(matches!(reports[0].status, IndexStatus::Mismatch { unique: false, .. }));
        assert!(reports[1..].iter().all(|r| r.status == IndexStatus::Missing));

        db.database().drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_concurrent_bootstrap() {
        // Two independent clients racing in one process; the server sees the
        // same pair of createIndexes calls two `init-index` processes would send.
        let first = scratch_db().await;
        let second = MongoDB::connect(&crate::config::Config {
            mongo_uri: crate::config::Config::from_env().unwrap().mongo_uri,
            database_name: first.database().name().to_string(),
        })
        .await
        .unwrap();

        let (a, b) = tokio::join!(ensure_indexes(&first), ensure_indexes(&second));
        a.unwrap();
        b.unwrap();

        for spec in INDEX_SPECS.iter() {
            let existing = list_existing(&first.collection::<Document>(spec.collection))
                .await
                .unwrap();
            assert_eq!(existing.iter().filter(|m| spec.matches(m)).count(), 1);
        }

        first.database().drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_check_on_empty_database() {
        let db = scratch_db().await;
        let reports = check_indexes(&db).await.unwrap();
        assert!(reports.iter().all(|r| r.status == IndexStatus::Missing));
    }
}
