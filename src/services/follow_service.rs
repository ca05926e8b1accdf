use crate::api::error::AppError;
use crate::entities::{prelude::*, user_follows, users};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
    sea_query::{Expr, OnConflict},
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

pub struct FollowService;

impl FollowService {
    async fn target<C: ConnectionTrait>(
        db: &C,
        target_id: i32,
    ) -> Result<users::Model, AppError> {
        Users::find_by_id(target_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    /// Adds `follower_id` to the target's followers. Following twice is a no-op.
    /// Returns the target so callers can name it.
    pub async fn follow<C: ConnectionTrait>(
        db: &C,
        follower_id: i32,
        target_id: i32,
    ) -> Result<users::Model, AppError> {
        let target = Self::target(db, target_id).await?;
        if target.id == follower_id {
            return Err(AppError::BadRequest("You cannot follow yourself.".to_string()));
        }

        let inserted = UserFollows::insert(user_follows::ActiveModel {
            follower_id: Set(follower_id),
            followee_id: Set(target.id),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                user_follows::Column::FollowerId,
                user_follows::Column::FolloweeId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        if inserted > 0 {
            tracing::info!("➕ User {} now follows {}", follower_id, target.id);
        }
        Ok(target)
    }

    /// Removes the edge if present; unfollowing someone not followed is a no-op.
    pub async fn unfollow<C: ConnectionTrait>(
        db: &C,
        follower_id: i32,
        target_id: i32,
    ) -> Result<users::Model, AppError> {
        let target = Self::target(db, target_id).await?;
        if target.id == follower_id {
            return Err(AppError::BadRequest("You cannot unfollow yourself.".to_string()));
        }

        let removed = UserFollows::delete_many()
            .filter(user_follows::Column::FollowerId.eq(follower_id))
            .filter(user_follows::Column::FolloweeId.eq(target.id))
            .exec(db)
            .await?;

        if removed.rows_affected > 0 {
            tracing::info!("➖ User {} unfollowed {}", follower_id, target.id);
        }
        Ok(target)
    }

    /// Users following `user_id`, ordered by id. 404 when the user does not exist.
    pub async fn followers<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
    ) -> Result<Vec<users::Model>, AppError> {
        Self::target(db, user_id).await?;
        Ok(Users::find()
            .join(JoinType::InnerJoin, user_follows::Relation::Follower.def().rev())
            .filter(user_follows::Column::FolloweeId.eq(user_id))
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?)
    }

    /// Users that `user_id` follows, ordered by id.
    pub async fn following<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
    ) -> Result<Vec<users::Model>, AppError> {
        Self::target(db, user_id).await?;
        Ok(Users::find()
            .join(JoinType::InnerJoin, user_follows::Relation::Followee.def().rev())
            .filter(user_follows::Column::FollowerId.eq(user_id))
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?)
    }

    /// Follower and following counts for each of `user_ids`, read in two
    /// grouped queries. Users without edges get zero counts.
    pub async fn counts<C: ConnectionTrait>(
        db: &C,
        user_ids: &[i32],
    ) -> Result<HashMap<i32, FollowCounts>, AppError> {
        let mut counts: HashMap<i32, FollowCounts> = user_ids
            .iter()
            .map(|id| (*id, FollowCounts::default()))
            .collect();
        if user_ids.is_empty() {
            return Ok(counts);
        }

        for (id, n) in Self::grouped(db, user_follows::Column::FolloweeId, user_ids).await? {
            counts.entry(id).or_default().followers = n;
        }
        for (id, n) in Self::grouped(db, user_follows::Column::FollowerId, user_ids).await? {
            counts.entry(id).or_default().following = n;
        }

        Ok(counts)
    }

    async fn grouped<C: ConnectionTrait>(
        db: &C,
        key: user_follows::Column,
        user_ids: &[i32],
    ) -> Result<Vec<(i32, u64)>, AppError> {
        let rows: Vec<(i32, i64)> = UserFollows::find()
            .select_only()
            .column(key)
            .column_as(Expr::col(key).count(), "total")
            .filter(key.is_in(user_ids.iter().copied()))
            .group_by(key)
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, n.max(0) as u64))
            .collect())
    }
}
