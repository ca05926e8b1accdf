//! Directed follow edges between users.
//!
//! The composite primary key `(follower_id, followee_id)` serves lookups of
//! "who does X follow"; a secondary index on `(followee_id, follower_id)` is
//! created at migration time for "who follows X".

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_follows")]
pub struct Model {
    /// The user who follows.
    #[sea_orm(primary_key, auto_increment = false)]
    pub follower_id: i32,
    /// The user being followed.
    #[sea_orm(primary_key, auto_increment = false)]
    pub followee_id: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FollowerId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Follower,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FolloweeId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Followee,
}

impl ActiveModelBehavior for ActiveModel {}
