use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;

/// A product record from the enriched catalog dataset.
///
/// The `*_clean` fields hold text that was already normalized by the data
/// preparation step and are what the statistics are computed from. Numeric
/// fields are optional and read from the `*_num` / `*_bool` columns of the
/// dataset; scoring documents its own default for each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "pid")]
    pub product_id: String,
    #[serde(default, serialize_with = "as_some", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, serialize_with = "as_some", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub title_clean: Option<String>,
    #[serde(default)]
    pub description_clean: Option<String>,
    #[serde(default)]
    pub metadata_clean: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default, rename = "selling_price_num")]
    pub selling_price: Option<f64>,
    #[serde(default, rename = "actual_price_num")]
    pub actual_price: Option<f64>,
    #[serde(default)]
    pub discount_pct: Option<f64>,
    #[serde(default, rename = "average_rating_num")]
    pub average_rating: Option<f64>,
    #[serde(default, rename = "out_of_stock_bool", serialize_with = "as_some", deserialize_with = "null_as_default")]
    pub out_of_stock: bool,
    /// Link to the product on the source marketplace.
    #[serde(default)]
    pub url: Option<String>,
}

/// Exported catalogs write `null` for missing cells; treat it like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Counterpart of `null_as_default` so non self-describing formats (bincode)
// read back what they wrote. JSON output is unchanged.
fn as_some<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.serialize_some(value)
}

impl Document {
    pub fn indexed_text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Title => self.title_clean.as_deref(),
            TextField::Description => self.description_clean.as_deref(),
            TextField::Metadata => self.metadata_clean.as_deref(),
        }
    }

    /// Price used for ranking signals: the selling price, or the list price
    /// when the selling price is missing or zero. 0 when neither is known.
    pub fn effective_price(&self) -> f64 {
        self.selling_price
            .filter(|p| *p != 0.0)
            .or(self.actual_price)
            .unwrap_or(0.0)
    }
}

/// Text fields that feed the term statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Title,
    Description,
    Metadata,
}

/// Indexed fields in the order they are concatenated before tokenizing.
pub const INDEXED_TEXT_FIELDS: [TextField; 3] = [TextField::Title, TextField::Description, TextField::Metadata];

/// One ranked hit, ready for rendering by a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub pid: String,
    pub title: String,
    pub description: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub selling_price: Option<f64>,
    pub actual_price: Option<f64>,
    pub discount: Option<f64>,
    pub average_rating: Option<f64>,
    pub out_of_stock: bool,
    pub ranking: f64,
    /// Internal details page, carries `pid` and `search_id`.
    pub url: String,
    pub source_url: Option<String>,
}

impl ResultItem {
    pub fn from_document(doc: &Document, ranking: f64, search_id: &str) -> Self {
        Self {
            pid: doc.product_id.clone(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            brand: doc.brand.clone(),
            category: doc.category.clone(),
            sub_category: doc.sub_category.clone(),
            selling_price: doc.selling_price,
            actual_price: doc.actual_price,
            discount: doc.discount_pct,
            average_rating: doc.average_rating,
            out_of_stock: doc.out_of_stock,
            ranking,
            url: details_url(&doc.product_id, search_id),
            source_url: doc.url.clone(),
        }
    }
}

pub fn details_url(pid: &str, search_id: &str) -> String {
    format!("/doc_details?pid={pid}&search_id={search_id}")
}

/// Caller-owned product lookup used to materialize results.
pub trait CorpusLookup {
    fn lookup(&self, product_id: &str) -> Option<&Document>;
}

impl CorpusLookup for HashMap<String, Document> {
    fn lookup(&self, product_id: &str) -> Option<&Document> { self.get(product_id) }
}

impl CorpusLookup for BTreeMap<String, Document> {
    fn lookup(&self, product_id: &str) -> Option<&Document> { self.get(product_id) }
}

/// Build a `pid -> Document` map from a loaded collection. Later records win on
/// duplicate ids.
pub fn corpus_by_pid(documents: &[Document]) -> HashMap<String, Document> {
    documents.iter().map(|d| (d.product_id.clone(), d.clone())).collect()
}
