use common::error::Res;
use db::models::user::User;
use sqlx::PgPool;

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Res<User> {
    db::user::get_user_by_id(pool, user_id).await
}
