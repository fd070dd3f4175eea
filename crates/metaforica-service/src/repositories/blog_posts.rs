use super::traits::{BlogPostRepository, DEFAULT_LIST_LIMIT, ListPostsParams, ListPostsResult};
use crate::errors::ApiError;
use crate::models::{
    BlogPost, BlogPostChanges, BlogPostChangesRow, BlogPostRow, NewBlogPost, NewBlogPostRow,
};
use crate::schema::blog_posts;
use crate::slug::unique_slug;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

#[derive(Clone)]
pub struct SqliteBlogPostRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteBlogPostRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<MutexGuard<'_, SqliteConnection>, ApiError> {
        self.db.lock().map_err(|_| {
            error!("Database mutex poisoned");
            ApiError::InternalError
        })
    }
}

/// Escapes `%`, `_` and `\` so user text is matched literally by `LIKE ... ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filtered(params: &ListPostsParams) -> Result<blog_posts::BoxedQuery<'static, Sqlite>, ApiError> {
    let mut query = blog_posts::table.into_boxed();

    if let Some(status) = params.status {
        query = query.filter(blog_posts::status.eq(status.as_str()));
    }

    if let Some(category) = &params.category {
        query = query.filter(blog_posts::category.eq(category.clone()));
    }

    if let Some(tag) = &params.tag {
        // Tags are stored as a JSON array, so match the quoted element.
        let quoted = serde_json::to_string(tag)?;
        let pattern = format!("%{}%", escape_like(&quoted));
        query = query.filter(blog_posts::tags.like(pattern).escape('\\'));
    }

    if let Some(text) = params.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(text));
        query = query.filter(
            blog_posts::title
                .like(pattern.clone())
                .escape('\\')
                .or(blog_posts::content.like(pattern.clone()).escape('\\'))
                .or(blog_posts::excerpt.like(pattern.clone()).escape('\\'))
                .or(blog_posts::category.like(pattern.clone()).escape('\\'))
                .or(blog_posts::tags.like(pattern).escape('\\')),
        );
    }

    Ok(query)
}

/// `(id, slug)` of every post whose slug is `base` or starts with `base-`.
fn taken_slugs(conn: &mut SqliteConnection, base: &str) -> QueryResult<Vec<(i32, String)>> {
    let rows = blog_posts::table
        .select((blog_posts::id, blog_posts::slug))
        .filter(
            blog_posts::slug
                .eq(base)
                .or(blog_posts::slug
                    .like(format!("{}-%", escape_like(base)))
                    .escape('\\')),
        )
        .load::<(i32, Option<String>)>(conn)?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, slug)| slug.map(|slug| (id, slug)))
        .collect())
}

/// First free slug derived from `requested`. Must run on the same connection
/// guard as the write that stores it.
fn resolve_slug(
    conn: &mut SqliteConnection,
    requested: Option<&str>,
    current_id: Option<i32>,
) -> QueryResult<Option<String>> {
    match requested.filter(|base| !base.is_empty()) {
        Some(base) => {
            let taken = taken_slugs(conn, base)?;
            Ok(Some(unique_slug(base, &taken, current_id)))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl BlogPostRepository for SqliteBlogPostRepository {
    async fn create(&self, post: &NewBlogPost) -> Result<BlogPost, ApiError> {
        let mut conn = self.conn()?;
        let result = conn.transaction::<_, ApiError, _>(|conn| {
            let slug = resolve_slug(conn, post.slug.as_deref(), None)?;
            let mut row = NewBlogPostRow::from_post(post)?;
            row.slug = slug.as_deref();
            Ok(diesel::insert_into(blog_posts::table)
                .values(&row)
                .returning(blog_posts::all_columns)
                .get_result::<BlogPostRow>(conn)?)
        })?;
        Ok(result.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<BlogPost>, ApiError> {
        let mut conn = self.conn()?;
        let result = blog_posts::table
            .find(id)
            .first::<BlogPostRow>(&mut *conn)
            .optional()?;
        Ok(result.map(BlogPost::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, ApiError> {
        let mut conn = self.conn()?;
        let result = blog_posts::table
            .filter(blog_posts::slug.eq(slug))
            .first::<BlogPostRow>(&mut *conn)
            .optional()?;
        Ok(result.map(BlogPost::from))
    }

    async fn list(&self, params: &ListPostsParams) -> Result<ListPostsResult, ApiError> {
        let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let mut conn = self.conn()?;

        let total: i64 = filtered(params)?.count().get_result(&mut *conn)?;

        let rows = filtered(params)?
            .order((blog_posts::publish_date.desc(), blog_posts::id.desc()))
            .limit(i64::from(limit))
            .offset(i64::from(offset))
            .load::<BlogPostRow>(&mut *conn)?;

        Ok(ListPostsResult {
            items: rows.into_iter().map(BlogPost::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update(
        &self,
        id: i32,
        changes: &BlogPostChanges,
    ) -> Result<Option<BlogPost>, ApiError> {
        let updated_at = chrono::Utc::now().naive_utc();
        let mut conn = self.conn()?;
        let result = conn.transaction::<_, ApiError, _>(|conn| {
            let slug = resolve_slug(conn, changes.slug.as_deref(), Some(id))?;
            let mut row = BlogPostChangesRow::from_changes(changes, updated_at)?;
            row.slug = slug.as_deref();
            Ok(diesel::update(blog_posts::table.find(id))
                .set(&row)
                .returning(blog_posts::all_columns)
                .get_result::<BlogPostRow>(conn)
                .optional()?)
        })?;
        Ok(result.map(BlogPost::from))
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(blog_posts::table.find(id)).execute(&mut *conn)?;
        Ok(deleted > 0)
    }
}
