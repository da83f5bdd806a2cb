pub mod article;

pub use article::{ArticleRecord, RawArticle};
