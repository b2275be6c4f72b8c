use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use aloite_db::models::NewInitiative;
use aloite_types::models::{Engagement, InitiativeDetail, InitiativeSummary};

use crate::Platform;
use crate::actor::ActorContext;
use crate::authz::{self, Action, Target, authorize};
use crate::convert::{engagement_from_row, facts, summary_from_row};
use crate::error::{CoreError, CoreResult};
use crate::image;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct InitiativeDraft<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Creator's choice; only consulted under `ActivationPolicy::CreatorChoice`.
    pub active: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct InitiativeEdit<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Platform {
    pub fn create_initiative(&self, actor: &ActorContext, draft: &InitiativeDraft<'_>) -> CoreResult<Uuid> {
        authorize(actor, Action::Create, &Target::None).into_result()?;
        let creator_id = actor.user_id().ok_or(CoreError::NotAuthenticated)?;

        let (title, description) = validate_text(draft.title, draft.description)?;
        validate_dates(draft.start_date, draft.end_date)?;
        let active = self.config.activation.initial_active(draft.active);

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let creator_str = creator_id.to_string();
        let start = draft.start_date.map(|d| d.to_string());
        let end = draft.end_date.map(|d| d.to_string());

        self.db.insert_initiative(&NewInitiative {
            id: &id_str,
            title,
            description,
            creator_id: &creator_str,
            start_date: start.as_deref(),
            end_date: end.as_deref(),
            active,
        })?;

        info!("Initiative {} created by {} (active={})", id, creator_id, active);
        Ok(id)
    }

    pub fn edit_initiative(
        &self,
        actor: &ActorContext,
        id: Uuid,
        edit: &InitiativeEdit<'_>,
    ) -> CoreResult<InitiativeSummary> {
        self.owner_guard(actor, id, Action::Edit)?;

        let (title, description) = validate_text(edit.title, edit.description)?;
        validate_dates(edit.start_date, edit.end_date)?;
        let start = edit.start_date.map(|d| d.to_string());
        let end = edit.end_date.map(|d| d.to_string());

        let key = id.to_string();
        if !self
            .db
            .update_initiative(&key, title, description, start.as_deref(), end.as_deref())?
        {
            return Err(CoreError::NotFound("initiative"));
        }

        info!("Initiative {} edited by {:?}", id, actor.user_id());
        self.find_initiative(actor, id).map(summary_from_row)
    }

    pub fn initiative(&self, actor: &ActorContext, id: Uuid) -> CoreResult<InitiativeDetail> {
        let row = self.visible_initiative(actor, id)?;
        authorize(actor, Action::View, &Target::Initiative(facts(&row))).into_result()?;

        let engaged_by_me = match actor.user_id() {
            Some(user_id) => self.db.has_signature(&user_id.to_string(), &row.id)?,
            None => false,
        };
        Ok(InitiativeDetail {
            summary: summary_from_row(row),
            engaged_by_me,
        })
    }

    /// Home listing: active, non-deleted initiatives, newest first.
    pub fn list_initiatives(&self, actor: &ActorContext) -> CoreResult<Vec<InitiativeSummary>> {
        authorize(actor, Action::List, &Target::None).into_result()?;
        Ok(self
            .db
            .list_public_initiatives()?
            .into_iter()
            .map(summary_from_row)
            .collect())
    }

    /// Substring search over title, description and creator name. A blank
    /// query matches nothing. Inactive initiatives only turn up for their
    /// creator and for admins.
    pub fn search(&self, actor: &ActorContext, query: &str) -> CoreResult<Vec<InitiativeSummary>> {
        authorize(actor, Action::Search, &Target::None).into_result()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .db
            .search_initiatives(
                query,
                actor.user_id().map(|id| id.to_string()).as_deref(),
                actor.is_admin(),
            )?
            .into_iter()
            .map(summary_from_row)
            .collect())
    }

    /// Non-deleted initiatives of one creator. Inactive ones are included for
    /// the creator themselves and for admins.
    pub fn initiatives_by_creator(
        &self,
        actor: &ActorContext,
        creator_id: Uuid,
    ) -> CoreResult<Vec<InitiativeSummary>> {
        authorize(actor, Action::List, &Target::None).into_result()?;
        self.user(creator_id)?;

        let include_inactive = actor.is_admin() || actor.is(creator_id);
        Ok(self
            .db
            .list_initiatives_by_creator(&creator_id.to_string(), include_inactive)?
            .into_iter()
            .map(summary_from_row)
            .collect())
    }

    /// Admin view of every initiative, or only the soft-deleted ones.
    pub fn admin_initiatives(
        &self,
        actor: &ActorContext,
        deleted_only: bool,
    ) -> CoreResult<Vec<InitiativeSummary>> {
        authorize(actor, Action::AdminList, &Target::None).into_result()?;
        let rows = if deleted_only {
            self.db.list_deleted_initiatives()?
        } else {
            self.db.list_all_initiatives()?
        };
        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    pub fn engagement_count(&self, actor: &ActorContext, id: Uuid) -> CoreResult<u64> {
        let row = self.visible_initiative(actor, id)?;
        authorize(actor, Action::View, &Target::Initiative(facts(&row))).into_result()?;
        Ok(self.db.count_signatures(&row.id)?)
    }

    /// Who signed: visible to the initiative's creator and admins.
    pub fn engagements(&self, actor: &ActorContext, id: Uuid) -> CoreResult<Vec<Engagement>> {
        let row = self.find_initiative(actor, id)?;
        authorize(actor, Action::ViewEngagements, &Target::Initiative(facts(&row))).into_result()?;
        Ok(self
            .db
            .list_signatures(&row.id)?
            .into_iter()
            .map(engagement_from_row)
            .collect())
    }

    // -- Images --

    pub fn set_image(&self, actor: &ActorContext, id: Uuid, bytes: &[u8]) -> CoreResult<()> {
        image::check_upload(bytes, self.config.max_image_bytes)?;
        self.owner_guard(actor, id, Action::Edit)?;

        if !self.db.set_initiative_image(&id.to_string(), Some(bytes))? {
            return Err(CoreError::NotFound("initiative"));
        }
        info!("Initiative {} image set ({} bytes)", id, bytes.len());
        Ok(())
    }

    /// Drop the uploaded image; the placeholder is served again.
    pub fn clear_image(&self, actor: &ActorContext, id: Uuid) -> CoreResult<()> {
        self.owner_guard(actor, id, Action::Edit)?;
        if !self.db.set_initiative_image(&id.to_string(), None)? {
            return Err(CoreError::NotFound("initiative"));
        }
        Ok(())
    }

    /// The uploaded image, or the shared placeholder.
    pub fn image(&self, actor: &ActorContext, id: Uuid) -> CoreResult<Vec<u8>> {
        let row = self.visible_initiative(actor, id)?;
        authorize(actor, Action::View, &Target::Initiative(facts(&row))).into_result()?;

        if !row.has_image {
            return Ok(self.placeholder.clone());
        }
        Ok(self
            .db
            .get_initiative_image(&row.id)?
            .unwrap_or_else(|| self.placeholder.clone()))
    }

    /// Authentication, lookup and ownership, in that order.
    fn owner_guard(&self, actor: &ActorContext, id: Uuid, action: Action) -> CoreResult<()> {
        authz::check_authenticated(actor, action)?;
        let row = self.find_initiative(actor, id)?;
        authorize(actor, action, &Target::Initiative(facts(&row))).into_result()?;
        Ok(())
    }
}

fn validate_text<'a>(title: &'a str, description: &'a str) -> CoreResult<(&'a str, &'a str)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok((title, description))
}

fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> CoreResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(CoreError::validation("end date is before start date"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(validate_text("  Free coffee ", "x").unwrap(), ("Free coffee", "x"));
        assert!(matches!(validate_text(" \t ", ""), Err(CoreError::Validation(_))));
        assert!(validate_text(&"a".repeat(MAX_TITLE_LEN + 1), "").is_err());
    }

    #[test]
    fn end_date_may_not_precede_start() {
        let may = NaiveDate::from_ymd_opt(2025, 5, 1);
        let june = NaiveDate::from_ymd_opt(2025, 6, 1);
        assert!(validate_dates(may, june).is_ok());
        assert!(validate_dates(may, may).is_ok());
        assert!(validate_dates(None, may).is_ok());
        assert!(validate_dates(june, may).is_err());
    }
}
