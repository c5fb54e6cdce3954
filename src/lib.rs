//! Decode HTML into typed Rust values
//!
//! A type implementing [`Pick`] names a root CSS query and, for each field, a
//! query plus the member it fills:
//! - scalars: `i32`, `i64`, `f32`, `f64`, `bool`, `String`
//! - lists of scalars or of nested [`Pick`] types
//! - nested [`Pick`] types, plain or `Option`
//!
//! Fields that match nothing, or whose text does not parse, keep the value the
//! type was constructed with. Only configuration problems are errors.
//!
//! Schemas can also be supplied as JSON at runtime, see [`Declaration`].

pub mod config;
pub mod declared;
pub mod decoder;
pub mod error;
pub mod extractors;
pub mod schema;

pub use config::{CoercionPolicy, DecoderConfig, Whitespace};
pub use declared::{CompiledDeclaration, Declaration, FieldDeclaration};
pub use decoder::{DecodeContext, Decoder};
pub use error::{BoxError, DecodeError};
pub use extractors::{Scalar, ScalarKind};
pub use schema::{Accessor, Field, FieldMeta, Kind, Pick, Populate, Schema, SchemaBuilder};

pub use scraper::{ElementRef, Html, Selector};

/// Parse `html` and decode it as `T` with a default [`Decoder`]
pub fn from_html<T: Pick>(html: &str) -> Result<T, DecodeError> {
    Decoder::new().decode_str(html)
}

/// Decode an already parsed document as `T` with a default [`Decoder`]
pub fn from_document<T: Pick>(document: &Html) -> Result<T, DecodeError> {
    Decoder::new().decode(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Author {
        name: String,
        profile: String,
    }

    impl Pick for Author {
        fn schema() -> SchemaBuilder<Self> {
            Schema::<Self>::builder("div.author")
                .string("name", ".name", |a| &mut a.name)
                .string("profile", "a @href", |a| &mut a.profile)
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Post {
        id: i64,
        title: String,
        score: f32,
        ratio: f64,
        pinned: bool,
        views: i32,
        tags: Vec<String>,
        author: Author,
        editor: Option<Author>,
        commenters: Vec<Author>,
    }

    impl Pick for Post {
        fn schema() -> SchemaBuilder<Self> {
            Schema::<Self>::builder("article.post")
                .long("id", "article.post @data-id", |p| &mut p.id)
                .string("title", "h1", |p| &mut p.title)
                .float("score", ".score", |p| &mut p.score)
                .double("ratio", ".ratio", |p| &mut p.ratio)
                .boolean("pinned", ".pinned", |p| &mut p.pinned)
                .int("views", ".views", |p| &mut p.views)
                .list("tags", "ul.tags li", |p| &mut p.tags)
                .object("author", "header div.author", |p| &mut p.author)
                .optional("editor", "div.editor", |p| &mut p.editor)
                .objects("commenters", "section.comments div.author", |p| &mut p.commenters)
        }
    }

    const POST: &str = r#"
    <html>
    <body>
        <article class="post" data-id="9000000001">
            <header>
                <h1>  Parsing   HTML </h1>
                <div class="author"><span class="name">Ada</span><a href="/u/ada">me</a></div>
            </header>
            <span class="score">4.5</span>
            <span class="ratio">0.125</span>
            <span class="pinned">True</span>
            <span class="views">many</span>
            <ul class="tags"><li>rust</li><li>html</li><li>parsing</li></ul>
            <section class="comments">
                <div class="author"><span class="name">Bob</span><a href="/u/bob">b</a></div>
                <div class="author"><span class="name">Ada</span><a href="/u/ada">me</a></div>
            </section>
        </article>
    </body>
    </html>
    "#;

    #[test]
    fn test_full_decode() {
        let post: Post = from_html(POST).unwrap();

        assert_eq!(post.id, 9_000_000_001);
        assert_eq!(post.title, "Parsing HTML");
        assert_eq!(post.score, 4.5);
        assert_eq!(post.ratio, 0.125);
        assert!(post.pinned);
        // "many" is not an int
        assert_eq!(post.views, 0);
        assert_eq!(post.tags, vec!["rust", "html", "parsing"]);
        assert_eq!(
            post.author,
            Author {
                name: "Ada".to_string(),
                profile: "/u/ada".to_string(),
            }
        );
        assert_eq!(post.editor, None);
        assert_eq!(post.commenters.len(), 2);
        assert_eq!(post.commenters[0].name, "Bob");
    }

    #[test]
    fn test_optional_object_present() {
        let html = POST.replace(
            "<span class=\"score\">",
            r#"<div class="editor"><span class="name">Zed</span><a href="/u/zed">z</a></div>
            <span class="score">"#,
        );
        let post: Post = from_html(&html).unwrap();

        assert_eq!(
            post.editor,
            Some(Author {
                name: "Zed".to_string(),
                profile: "/u/zed".to_string(),
            })
        );
        assert_eq!(post.author.name, "Ada");
    }

    #[test]
    fn test_nested_matches_list_element() {
        let post: Post = from_html(POST).unwrap();
        // Same markup reached directly and through a list decodes the same
        assert_eq!(post.author, post.commenters[1]);
    }

    #[test]
    fn test_empty_document_equals_default() {
        let post: Post = from_html("").unwrap();
        assert_eq!(post, Post::default());

        let author: Author = from_document(&Html::parse_document("<p>no author</p>")).unwrap();
        assert_eq!(author, Author::default());
    }

    #[test]
    fn test_strict_decode_surfaces_bad_data() {
        let decoder = Decoder::with_config(DecoderConfig::strict()).unwrap();
        match decoder.decode_str::<Post>(POST) {
            Err(DecodeError::Coercion { field, kind, raw }) => {
                assert_eq!(field, "views");
                assert_eq!(kind, ScalarKind::Int);
                assert_eq!(raw, "many");
            }
            other => panic!("expected Coercion, got {:?}", other),
        }
    }

    #[test]
    fn test_list_scenario() {
        #[derive(Debug, Default)]
        struct Items {
            entries: Vec<String>,
        }

        impl Pick for Items {
            fn schema() -> SchemaBuilder<Self> {
                Schema::<Self>::builder("ul").list("entries", "li", |i| &mut i.entries)
            }
        }

        let items: Items = from_html("<ul><li>a</li><li>b</li><li>c</li></ul>").unwrap();
        assert_eq!(items.entries, vec!["a", "b", "c"]);
    }
}
