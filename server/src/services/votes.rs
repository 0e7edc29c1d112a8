use color_eyre::eyre::WrapErr;
use db::cooking::{Recipe, Vote};
use db::notifications::Notification;
use db::users::User;
use db::PgPool;

use super::{conflict, conflict_on_violation, not_found, ServiceResult};

const ALREADY_VOTED: &str = "User has already voted for this recipe";

pub(crate) fn recipe_link(recipe_id: i32) -> String {
    format!("/recipes/{recipe_id}")
}

/// Records a like. The recipe owner is notified unless they liked their own
/// recipe. The vote and the notification commit together.
#[tracing::instrument(skip(pool), err)]
pub(crate) async fn vote(pool: &PgPool, user_id: i32, recipe_id: i32) -> ServiceResult<Vote> {
    let voter = User::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| not_found("User not found"))?;
    let (owner_id, recipe_name) = Recipe::owner(pool, recipe_id)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))?;

    if Vote::exists(pool, user_id, recipe_id).await? {
        return Err(conflict(ALREADY_VOTED));
    }

    let mut transaction = pool
        .begin()
        .await
        .wrap_err("Failed to start the vote transaction")?;

    let vote = Vote::create(&mut *transaction, user_id, recipe_id)
        .await
        .map_err(|err| conflict_on_violation(err, ALREADY_VOTED))?;

    if owner_id != user_id {
        Notification::create(
            &mut *transaction,
            owner_id,
            &format!("{} liked your recipe \"{recipe_name}\"", voter.name),
            &recipe_link(recipe_id),
        )
        .await?;
    }

    transaction
        .commit()
        .await
        .wrap_err("Failed to commit the vote")?;

    Ok(vote)
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn unvote(pool: &PgPool, user_id: i32, recipe_id: i32) -> ServiceResult<()> {
    if Vote::delete(pool, user_id, recipe_id).await? {
        Ok(())
    } else {
        Err(not_found("Vote not found"))
    }
}

#[cfg(test)]
mod tests {
    use db::cooking::{Area, Category, NewRecipe};
    use db::users::UserRole;

    use super::*;
    use crate::services::ServiceError;

    #[test]
    fn links_point_at_the_recipe_page() {
        assert_eq!(recipe_link(12), "/recipes/12");
    }

    /// An owner, a fan and one recipe by the owner.
    async fn owner_fan_and_recipe(pool: &PgPool) -> (User, User, i32) {
        let owner = User::create(
            pool,
            "Owner".to_string(),
            "owner@example.com".to_string(),
            None,
            UserRole::User,
        )
        .await
        .unwrap();
        let fan = User::create(
            pool,
            "Fan".to_string(),
            "fan@example.com".to_string(),
            None,
            UserRole::User,
        )
        .await
        .unwrap();
        let area = Area::create(pool, "Saigon".to_string(), true).await.unwrap();
        let category = Category::create(pool, "Street food".to_string())
            .await
            .unwrap();
        let recipe_id = Recipe::create_with_details(
            pool,
            NewRecipe {
                name: "Bánh mì".to_string(),
                description: "Baguette sandwich".to_string(),
                user_id: owner.id,
                area_id: area.id,
                category_ids: vec![category.id],
                thumbnails: vec![],
                steps: vec![],
                ingredients: vec![],
            },
        )
        .await
        .unwrap();

        (owner, fan, recipe_id)
    }

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn voting_notifies_the_owner_once(pool: PgPool) {
        let (owner, fan, recipe_id) = owner_fan_and_recipe(&pool).await;

        vote(&pool, fan.id, recipe_id).await.unwrap();
        vote(&pool, owner.id, recipe_id).await.unwrap();

        let again = vote(&pool, fan.id, recipe_id).await.unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));

        let notifications = Notification::list_for_user(&pool, owner.id, false)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].link, recipe_link(recipe_id));
        assert!(notifications[0].content.contains("Fan"));

        unvote(&pool, fan.id, recipe_id).await.unwrap();
        assert!(matches!(
            unvote(&pool, fan.id, recipe_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn failed_notification_rolls_back_the_vote(pool: PgPool) {
        let (_owner, fan, recipe_id) = owner_fan_and_recipe(&pool).await;

        sqlx::query(
            "CREATE FUNCTION reject_notification() RETURNS trigger AS $$
             BEGIN
                 RAISE EXCEPTION 'notifications are unavailable';
             END
             $$ LANGUAGE plpgsql",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_notification BEFORE INSERT ON notifications
             FOR EACH ROW EXECUTE FUNCTION reject_notification()",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = vote(&pool, fan.id, recipe_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert!(!Vote::exists(&pool, fan.id, recipe_id).await.unwrap());
    }
}
