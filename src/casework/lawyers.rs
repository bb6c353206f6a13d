use serde::Serialize;

use crate::db::{Database, LawyerRecord};
use crate::error::CaseworkError;
use crate::forms::{FieldErrors, Form, FormData, LawyerInlineForm};

pub const LAWYER_SEARCH_LIMIT: usize = 10;

/// Which intake lawyer picker a lawyer is being created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LawyerSide {
    #[default]
    Plaintiff,
    Defense,
}

impl LawyerSide {
    /// Missing means plaintiff; unknown values are rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            None => Ok(Self::Plaintiff),
            Some("plaintiff") => Ok(Self::Plaintiff),
            Some("defense") => Ok(Self::Defense),
            Some(other) => Err(format!(
                "side must be 'plaintiff' or 'defense', got '{other}'"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff",
            Self::Defense => "defense",
        }
    }

    /// Name of the intake selection control this side fills.
    pub fn select_name(self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff_lawyer",
            Self::Defense => "defense_lawyer",
        }
    }
}

/// A lawyer created from the inline form, for the page to add to its picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedLawyer {
    pub id: i64,
    pub name: String,
    pub side: LawyerSide,
}

#[derive(Debug)]
pub enum LawyerCreateOutcome {
    Created(CreatedLawyer),
    Invalid(FieldErrors),
}

/// Create a lawyer, attaching (and if needed creating) the named firm.
pub async fn create_inline_lawyer(
    db: &dyn Database,
    data: &FormData,
    side: LawyerSide,
) -> Result<LawyerCreateOutcome, CaseworkError> {
    let input = match LawyerInlineForm::clean(data) {
        Ok(input) => input,
        Err(errors) => {
            tracing::debug!(fields = ?errors, "Inline lawyer rejected");
            return Ok(LawyerCreateOutcome::Invalid(errors));
        }
    };

    let created = db
        .create_lawyer_in_firm(&input.to_params(), input.law_firm_name.as_deref())
        .await?;
    if let Some(firm) = created.firm.as_ref().filter(|_| created.firm_created) {
        tracing::info!(law_firm_id = firm.id, name = %firm.name, "Law firm created");
    }
    tracing::info!(
        lawyer_id = created.lawyer.id,
        law_firm_id = ?created.lawyer.law_firm_id,
        side = side.as_str(),
        "Lawyer created"
    );

    Ok(LawyerCreateOutcome::Created(CreatedLawyer {
        id: created.lawyer.id,
        name: created.lawyer.name,
        side,
    }))
}

/// Matches for the intake lawyer pickers, tagged with the input to fill.
#[derive(Debug, Clone, Serialize)]
pub struct LawyerSearch {
    pub lawyers: Vec<LawyerRecord>,
    pub input_id: &'static str,
}

/// Search by name for whichever picker is asking. The plaintiff query wins
/// when both are sent; a blank query matches nothing.
pub async fn search_lawyers(
    db: &dyn Database,
    plaintiff_query: Option<&str>,
    defense_query: Option<&str>,
) -> Result<LawyerSearch, CaseworkError> {
    let input_id = if plaintiff_query.is_some() {
        "plaintiff-lawyer-id"
    } else {
        "defense-lawyer-id"
    };
    let query = plaintiff_query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .or_else(|| defense_query.map(str::trim))
        .unwrap_or_default();

    let lawyers = if query.is_empty() {
        Vec::new()
    } else {
        db.search_lawyers(query, LAWYER_SEARCH_LIMIT).await?
    };
    Ok(LawyerSearch { lawyers, input_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CreateLawyerParams;
    use crate::testing::test_db;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn side_parsing() {
        assert_eq!(LawyerSide::parse(None), Ok(LawyerSide::Plaintiff));
        assert_eq!(LawyerSide::parse(Some("defense")), Ok(LawyerSide::Defense));
        assert!(LawyerSide::parse(Some("judge")).is_err());
        assert!(LawyerSide::parse(Some("")).is_err());
        assert_eq!(LawyerSide::Defense.select_name(), "defense_lawyer");
    }

    #[tokio::test]
    async fn new_firm_is_created_once_and_shared() {
        let (db, _dir) = test_db().await;

        let first = create_inline_lawyer(
            db.as_ref(),
            &form(&[("name", "Jane Roe"), ("law_firm_name", "Acme Legal")]),
            LawyerSide::Plaintiff,
        )
        .await
        .expect("first");
        let LawyerCreateOutcome::Created(first) = first else {
            panic!("expected created");
        };
        assert_eq!(first.name, "Jane Roe");

        let second = create_inline_lawyer(
            db.as_ref(),
            &form(&[("name", "John Doe"), ("law_firm_name", "Acme Legal")]),
            LawyerSide::Defense,
        )
        .await
        .expect("second");
        let LawyerCreateOutcome::Created(second) = second else {
            panic!("expected created");
        };
        assert_eq!(second.side, LawyerSide::Defense);

        let firms = db.list_law_firms().await.expect("firms");
        assert_eq!(firms.len(), 1);
        let a = db.get_lawyer(first.id).await.expect("get").expect("a");
        let b = db.get_lawyer(second.id).await.expect("get").expect("b");
        assert_eq!(a.law_firm_id, Some(firms[0].id));
        assert_eq!(b.law_firm_id, Some(firms[0].id));
    }

    #[tokio::test]
    async fn missing_name_writes_nothing() {
        let (db, _dir) = test_db().await;
        let outcome = create_inline_lawyer(
            db.as_ref(),
            &form(&[("law_firm_name", "Acme Legal")]),
            LawyerSide::Plaintiff,
        )
        .await
        .expect("outcome");
        assert!(matches!(outcome, LawyerCreateOutcome::Invalid(ref e) if e.has("name")));
        assert!(db.list_law_firms().await.expect("firms").is_empty());
    }

    #[tokio::test]
    async fn search_picks_input_and_ignores_blank_queries() {
        let (db, _dir) = test_db().await;
        for name in ["Will Smith", "Anna Blacksmith", "Jones"] {
            db.create_lawyer(&CreateLawyerParams {
                name: name.to_string(),
                ..CreateLawyerParams::default()
            })
            .await
            .expect("seed");
        }

        let result = search_lawyers(db.as_ref(), Some("SMITH"), None)
            .await
            .expect("search");
        assert_eq!(result.input_id, "plaintiff-lawyer-id");
        let names: Vec<&str> = result.lawyers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Anna Blacksmith", "Will Smith"]);

        let result = search_lawyers(db.as_ref(), None, Some("jon"))
            .await
            .expect("search");
        assert_eq!(result.input_id, "defense-lawyer-id");
        assert_eq!(result.lawyers.len(), 1);

        let result = search_lawyers(db.as_ref(), Some("   "), None)
            .await
            .expect("search");
        assert!(result.lawyers.is_empty());
        assert_eq!(result.input_id, "plaintiff-lawyer-id");

        let result = search_lawyers(db.as_ref(), Some(""), Some("jones"))
            .await
            .expect("search");
        assert_eq!(result.input_id, "plaintiff-lawyer-id");
        assert_eq!(result.lawyers.len(), 1, "empty plaintiff query falls through");

        let result = search_lawyers(db.as_ref(), Some("  "), Some(" jones "))
            .await
            .expect("search");
        assert_eq!(result.input_id, "plaintiff-lawyer-id");
        assert_eq!(
            result.lawyers.len(),
            1,
            "whitespace-only plaintiff query falls through"
        );

        let result = search_lawyers(db.as_ref(), None, None).await.expect("search");
        assert!(result.lawyers.is_empty());
    }
}
