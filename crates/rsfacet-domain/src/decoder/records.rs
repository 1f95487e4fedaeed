//! Typed views over decoded positional blocks.

use serde::Serialize;

use super::PositionalRecord;

fn owned(record: &PositionalRecord, name: &str) -> Option<String> {
    record.get(name).map(str::to_string)
}

/// A record this record is part of (series, multi-part work, host item).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParentRecord {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub part_no: Option<String>,
    pub part_name: Option<String>,
    pub order_no: Option<String>,
    pub form: Option<String>,
    pub level: Option<String>,
    pub vol_no_245: Option<String>,
    pub vol_no_490: Option<String>,
    pub vol_no_773: Option<String>,
    pub vol_no_830: Option<String>,
    pub ac_no: Option<String>,
    pub id: Option<String>,
}

impl ParentRecord {
    /// The most specific volume designation available, in MARC 245, 490,
    /// 773, 830 precedence.
    pub fn volume(&self) -> Option<&str> {
        self.vol_no_245
            .as_deref()
            .or(self.vol_no_490.as_deref())
            .or(self.vol_no_773.as_deref())
            .or(self.vol_no_830.as_deref())
    }
}

impl From<&PositionalRecord> for ParentRecord {
    fn from(record: &PositionalRecord) -> Self {
        Self {
            title: owned(record, "title"),
            sub_title: owned(record, "sub_title"),
            part_no: owned(record, "part_no"),
            part_name: owned(record, "part_name"),
            order_no: owned(record, "order_no"),
            form: owned(record, "form"),
            level: owned(record, "level"),
            vol_no_245: owned(record, "vol_no_245"),
            vol_no_490: owned(record, "vol_no_490"),
            vol_no_773: owned(record, "vol_no_773"),
            vol_no_830: owned(record, "vol_no_830"),
            ac_no: owned(record, "ac_no"),
            id: owned(record, "id"),
        }
    }
}

/// A record that is part of this record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChildRecord {
    #[serde(flatten)]
    pub base: ParentRecord,
    pub edition: Option<String>,
    pub publish_date: Option<String>,
    pub publisher: Option<String>,
    pub place: Option<String>,
    pub format: Option<String>,
}

impl From<&PositionalRecord> for ChildRecord {
    fn from(record: &PositionalRecord) -> Self {
        Self {
            base: ParentRecord::from(record),
            edition: owned(record, "edition"),
            publish_date: owned(record, "publish_date"),
            publisher: owned(record, "publisher"),
            place: owned(record, "place"),
            format: owned(record, "format"),
        }
    }
}

/// A generic named relation ("Translation of", "Continued by", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedRecord {
    pub relation_label: Option<String>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub part_no: Option<String>,
    pub vol_no: Option<String>,
    pub ac_no: Option<String>,
    pub id: Option<String>,
}

impl From<&PositionalRecord> for RelatedRecord {
    fn from(record: &PositionalRecord) -> Self {
        Self {
            relation_label: owned(record, "relation_label"),
            title: owned(record, "title"),
            sub_title: owned(record, "sub_title"),
            part_no: owned(record, "part_no"),
            vol_no: owned(record, "vol_no"),
            ac_no: owned(record, "ac_no"),
            id: owned(record, "id"),
        }
    }
}
