//! Outbound requests.
//!
//! Each `encode_*` function returns a complete frame (header followed by
//! body) ready to be written in one call. Query types normalize their label
//! argument on construction, so a legacy stream list never reaches the wire.
//!
//! Body layouts are positional tuples and must match what the server
//! unpacks:
//!
//! ```text
//! SUBSCRIBE   (name, start, end, columns, labels, aggregation)
//! UNSUBSCRIBE (collection, streams)
//! MATRIX      (collection, start, end, labels, agg_columns, agg_func)
//! AGGREGATE   (collection, start, end, labels, agg_columns, group_columns, bin_size, agg_func)
//! PERCENTILE  (collection, start, end, labels, bin_size, percentile_columns,
//!              other_columns, percentile_agg_func, other_agg_func)
//! ```

use crate::codec::StructuredCodec;
use crate::error::{NntscError, Result};
use crate::labels::{LabelSet, Labels};
use crate::message::StreamKey;
use crate::protocol::{build_frame, encode_request_body, MessageType, RequestKind};
use crate::Value;

/// Aggregation function used when none is given.
pub const DEFAULT_AGG_FUNC: &str = "avg";

/// Build a REQUEST frame.
///
/// Collection list requests always carry collection 0. The retired active
/// streams request is rejected. Ids outside `0..=u32::MAX` are a protocol
/// error.
pub fn encode_request(kind: RequestKind, collection: i64, start: i64) -> Result<Vec<u8>> {
    let collection = match kind {
        RequestKind::Collections => 0,
        RequestKind::ActiveStreams => {
            return Err(NntscError::UnsupportedOperation(
                "requesting active streams is no longer supported by NNTSC".to_string(),
            ))
        }
        RequestKind::Schema | RequestKind::Streams => collection,
    };
    let collection = wire_id("collection", collection)?;
    let start = wire_id("start", start)?;
    build_frame(
        MessageType::Request,
        &encode_request_body(kind, collection, start),
    )
}

/// REQUEST ids travel as unsigned 32-bit fields.
fn wire_id(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        NntscError::Protocol(format!("REQUEST {} {} is out of range", field, value))
    })
}

/// A live-data subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub name: String,
    pub columns: Vec<String>,
    pub labels: LabelSet,
    pub start: i64,
    pub end: i64,
    /// Aggregation parameters, passed through untouched.
    pub aggregation: Value,
}

impl Subscription {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        labels: impl Into<Labels>,
        start: i64,
        end: i64,
        aggregation: Value,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            labels: labels.into().normalize(),
            start,
            end,
            aggregation,
        }
    }
}

/// Build a SUBSCRIBE frame.
pub fn encode_subscribe<C: StructuredCodec>(sub: &Subscription) -> Result<Vec<u8>> {
    let body = C::encode(&(
        &sub.name,
        sub.start,
        sub.end,
        &sub.columns,
        &sub.labels,
        &sub.aggregation,
    ))?;
    build_frame(MessageType::Subscribe, &body)
}

/// Build an UNSUBSCRIBE frame.
pub fn encode_unsubscribe<C: StructuredCodec>(collection: i64, streams: &[StreamKey]) -> Result<Vec<u8>> {
    let body = C::encode(&(collection, streams))?;
    build_frame(MessageType::Unsubscribe, &body)
}

/// Unaggregated data for a set of labels over a time range.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixQuery {
    pub collection: i64,
    pub labels: LabelSet,
    pub start: i64,
    pub end: i64,
    pub agg_columns: Vec<String>,
    pub agg_func: String,
}

impl MatrixQuery {
    pub fn new(
        collection: i64,
        labels: impl Into<Labels>,
        start: i64,
        end: i64,
        agg_columns: Vec<String>,
        agg_func: impl Into<String>,
    ) -> Self {
        Self {
            collection,
            labels: labels.into().normalize(),
            start,
            end,
            agg_columns,
            agg_func: agg_func.into(),
        }
    }
}

/// Build a MATRIX frame.
pub fn encode_matrix<C: StructuredCodec>(query: &MatrixQuery) -> Result<Vec<u8>> {
    let body = C::encode(&(
        query.collection,
        query.start,
        query.end,
        &query.labels,
        &query.agg_columns,
        &query.agg_func,
    ))?;
    build_frame(MessageType::Matrix, &body)
}

/// Binned aggregate data for a set of labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub collection: i64,
    pub labels: LabelSet,
    pub start: i64,
    pub end: i64,
    pub agg_columns: Vec<String>,
    pub bin_size: i64,
    /// Defaults to no grouping.
    pub group_columns: Vec<String>,
    /// Defaults to [`DEFAULT_AGG_FUNC`].
    pub agg_func: String,
}

impl AggregateQuery {
    pub fn new(
        collection: i64,
        labels: impl Into<Labels>,
        start: i64,
        end: i64,
        agg_columns: Vec<String>,
        bin_size: i64,
    ) -> Self {
        Self {
            collection,
            labels: labels.into().normalize(),
            start,
            end,
            agg_columns,
            bin_size,
            group_columns: Vec::new(),
            agg_func: DEFAULT_AGG_FUNC.to_string(),
        }
    }

    pub fn group_columns(mut self, columns: Vec<String>) -> Self {
        self.group_columns = columns;
        self
    }

    pub fn agg_func(mut self, func: impl Into<String>) -> Self {
        self.agg_func = func.into();
        self
    }
}

/// Build an AGGREGATE frame.
pub fn encode_aggregate<C: StructuredCodec>(query: &AggregateQuery) -> Result<Vec<u8>> {
    let body = C::encode(&(
        query.collection,
        query.start,
        query.end,
        &query.labels,
        &query.agg_columns,
        &query.group_columns,
        query.bin_size,
        &query.agg_func,
    ))?;
    build_frame(MessageType::Aggregate, &body)
}

/// Percentile summaries per bin, plus plain aggregates of other columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileQuery {
    pub collection: i64,
    pub labels: LabelSet,
    pub start: i64,
    pub end: i64,
    pub bin_size: i64,
    pub percentile_columns: Vec<String>,
    /// Defaults to none.
    pub other_columns: Vec<String>,
    /// Defaults to [`DEFAULT_AGG_FUNC`].
    pub percentile_agg_func: String,
    /// Defaults to [`DEFAULT_AGG_FUNC`].
    pub other_agg_func: String,
}

impl PercentileQuery {
    pub fn new(
        collection: i64,
        labels: impl Into<Labels>,
        start: i64,
        end: i64,
        bin_size: i64,
        percentile_columns: Vec<String>,
    ) -> Self {
        Self {
            collection,
            labels: labels.into().normalize(),
            start,
            end,
            bin_size,
            percentile_columns,
            other_columns: Vec::new(),
            percentile_agg_func: DEFAULT_AGG_FUNC.to_string(),
            other_agg_func: DEFAULT_AGG_FUNC.to_string(),
        }
    }

    pub fn other_columns(mut self, columns: Vec<String>) -> Self {
        self.other_columns = columns;
        self
    }

    pub fn percentile_agg_func(mut self, func: impl Into<String>) -> Self {
        self.percentile_agg_func = func.into();
        self
    }

    pub fn other_agg_func(mut self, func: impl Into<String>) -> Self {
        self.other_agg_func = func.into();
        self
    }
}

/// Build a PERCENTILE frame.
pub fn encode_percentile<C: StructuredCodec>(query: &PercentileQuery) -> Result<Vec<u8>> {
    let body = C::encode(&(
        query.collection,
        query.start,
        query.end,
        &query.labels,
        query.bin_size,
        &query.percentile_columns,
        &query.other_columns,
        &query.percentile_agg_func,
        &query.other_agg_func,
    ))?;
    build_frame(MessageType::Percentile, &body)
}
