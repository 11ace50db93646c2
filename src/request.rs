use crate::core::models::ResponseQuery;
use crate::core::services::report::parse_day;
use crate::error::Error;
use crate::serde::Deserialize;

/// Query string shared by the report and export endpoints.
/// `groups` is a comma separated list of group keys.
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub client: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub user: Option<String>,
    pub groups: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

impl TryFrom<ReportFilter> for ResponseQuery {
    type Error = Error;
    fn try_from(filter: ReportFilter) -> Result<Self, Self::Error> {
        let date_from = non_blank(filter.from).map(|d| parse_day(&d)).transpose()?;
        let date_to = non_blank(filter.to).map(|d| parse_day(&d)).transpose()?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(Error::BusinessError("start date is after end date".into()));
            }
        }
        Ok(ResponseQuery {
            username_eq: non_blank(filter.user),
            client_name_eq: non_blank(filter.client),
            date_from,
            date_to,
            group_key_in: non_blank(filter.groups).map(|g| g.split(',').map(|k| k.trim().to_owned()).filter(|k| !k.is_empty()).collect()),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_filter_to_query() {
        let q = ResponseQuery::try_from(ReportFilter {
            client: Some(" ACME ".into()),
            from: Some("2024-01-01".into()),
            to: Some("".into()),
            user: None,
            groups: Some("G1, G3,".into()),
        })
        .unwrap();
        assert_eq!(q.client_name_eq.as_deref(), Some("ACME"));
        assert_eq!(q.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(q.date_to.is_none());
        assert_eq!(q.group_key_in, Some(vec!["G1".to_owned(), "G3".to_owned()]));
    }

    #[test]
    fn test_rejects_bad_dates() {
        let bad = ReportFilter {
            from: Some("01/02/2024".into()),
            ..Default::default()
        };
        assert!(matches!(ResponseQuery::try_from(bad), Err(Error::ParseDate(_))));
        let inverted = ReportFilter {
            from: Some("2024-02-01".into()),
            to: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(ResponseQuery::try_from(inverted).is_err());
    }
}
