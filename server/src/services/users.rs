use db::users::{User, UserChanges, UserRole};
use db::PgPool;
use serde::Deserialize;

use super::{conflict, conflict_on_violation, not_found, required_text, validation, ServiceResult};

const EMAIL_TAKEN: &str = "Email already exists";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `null` clears the avatar; leaving the field out keeps it.
    #[serde(default, deserialize_with = "present")]
    pub avatar_url: Option<Option<String>>,
    pub role: Option<UserRole>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn checked_email(value: &str) -> ServiceResult<String> {
    let email = required_text(Some(value), "Email is required")?;
    if !email.contains('@') {
        return Err(validation("Email is not valid"));
    }

    Ok(email)
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn create(pool: &PgPool, input: CreateUserInput) -> ServiceResult<User> {
    let name = required_text(input.name.as_deref(), "Name is required")?;
    let email = checked_email(input.email.as_deref().unwrap_or_default())?;

    if User::get_by_email(pool, &email).await?.is_some() {
        return Err(conflict(EMAIL_TAKEN));
    }

    User::create(
        pool,
        name,
        email,
        input.avatar_url.filter(|a| !a.trim().is_empty()),
        input.role.unwrap_or_default(),
    )
    .await
    .map_err(|err| conflict_on_violation(err, EMAIL_TAKEN))
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn update(pool: &PgPool, id: i32, input: UpdateUserInput) -> ServiceResult<User> {
    let name = input
        .name
        .as_deref()
        .map(|n| required_text(Some(n), "Name cannot be empty"))
        .transpose()?;
    let email = input.email.as_deref().map(checked_email).transpose()?;

    if let Some(email) = &email {
        if let Some(existing) = User::get_by_email(pool, email).await? {
            if existing.id != id {
                return Err(conflict(EMAIL_TAKEN));
            }
        }
    }

    User::update(
        pool,
        id,
        UserChanges {
            name,
            email,
            avatar_url: input.avatar_url,
            role: input.role,
        },
    )
    .await
    .map_err(|err| conflict_on_violation(err, EMAIL_TAKEN))?
    .ok_or_else(|| not_found("User not found"))
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn delete(pool: &PgPool, id: i32) -> ServiceResult<()> {
    if User::delete(pool, id).await? {
        Ok(())
    } else {
        Err(not_found("User not found"))
    }
}

pub(crate) async fn get(pool: &PgPool, id: i32) -> ServiceResult<User> {
    User::get_by_id(pool, id)
        .await?
        .ok_or_else(|| not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;

    #[test]
    fn emails_need_an_at_sign() {
        assert_eq!(checked_email(" lan@example.com ").unwrap(), "lan@example.com");
        assert!(matches!(checked_email("lan.example.com"), Err(ServiceError::Validation(_))));
        assert!(matches!(checked_email(""), Err(ServiceError::Validation(m)) if m == "Email is required"));
    }

    #[test]
    fn avatar_null_differs_from_absent() {
        let absent: UpdateUserInput = serde_json::from_str(r#"{"name":"Lan"}"#).unwrap();
        assert_eq!(absent.avatar_url, None);

        let cleared: UpdateUserInput = serde_json::from_str(r#"{"avatarUrl":null}"#).unwrap();
        assert_eq!(cleared.avatar_url, Some(None));

        let set: UpdateUserInput =
            serde_json::from_str(r#"{"avatarUrl":"https://img.example.com/a.png"}"#).unwrap();
        assert_eq!(
            set.avatar_url,
            Some(Some("https://img.example.com/a.png".to_string()))
        );
    }

    #[test]
    fn roles_parse_from_lowercase_names() {
        let input: CreateUserInput =
            serde_json::from_str(r#"{"name":"Admin","email":"a@b.c","role":"admin"}"#).unwrap();

        assert_eq!(input.role, Some(UserRole::Admin));
    }
}
