mod book;
pub use book::*;
mod bookmark;
pub use bookmark::*;
mod comment;
pub use comment::*;
mod feed;
pub use feed::*;
mod follow;
pub use follow::*;
mod like;
pub use like::*;
mod mood;
pub use mood::*;
mod notification;
pub use notification::*;
mod post;
pub use post::*;
mod quote;
pub use quote::*;
mod recommendation;
pub use recommendation::*;
mod summary;
pub use summary::*;
mod tag;
pub use tag::*;
mod user;
pub use user::*;

use sqlx::{Executor, PgPool};

pub async fn prepare_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("sql/schema.sql")).await?;
    Ok(())
}

