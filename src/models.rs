use async_graphql::SimpleObject;
use serde::{Deserialize, Deserializer, Serialize};

/// A field a caller can ask the content store to populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Excerpt,
    Date,
    Slug,
    Author,
    Content,
    OgImage,
    CoverImage,
}

impl PostField {
    /// Every field of a post, in schema order.
    pub const ALL: [PostField; 8] = [
        PostField::Title,
        PostField::Excerpt,
        PostField::Date,
        PostField::Slug,
        PostField::Author,
        PostField::Content,
        PostField::OgImage,
        PostField::CoverImage,
    ];
}

#[derive(SimpleObject, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub picture: Option<String>,
}

#[derive(SimpleObject, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[graphql(name = "ogImage")]
#[serde(default)]
pub struct OgImage {
    pub url: Option<String>,
    #[graphql(name = "secure_url")]
    pub secure_url: Option<String>,
    #[graphql(name = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub width: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub height: Option<String>,
    pub alt: Option<String>,
}

/// A blog post. Which fields are set depends on the projection it was loaded
/// with; `content` is markdown when it leaves the store and HTML once a page
/// loader has rendered it.
#[derive(SimpleObject, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Post {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub date: Option<String>,
    pub slug: Option<String>,
    pub author: Option<Author>,
    pub content: Option<String>,
    pub og_image: Option<OgImage>,
    pub cover_image: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub excerpt: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
    pub author: Option<Author>,
    pub og_image: Option<OgImage>,
    #[serde(deserialize_with = "scalar_string")]
    pub cover_image: Option<String>,
}

// YAML turns `title: 1984`, `width: 1200` or `excerpt: yes` into non-strings,
// while every scalar in the schema is a string.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}
