//! Broker topology: one exchange, one queue and routing key per operation

use std::fmt;

/// Exchange every operation queue is bound to
pub const DEFAULT_EXCHANGE: &str = "leaktest-exchange";

/// The RPC operations the service consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddSingle,
    AddBatch,
    GetAll,
    GetById,
    GetByTag,
    GetByField,
    GetWithinTimeFrame,
}

impl Operation {
    /// Every operation, in declaration order
    pub const ALL: [Operation; 7] = [
        Operation::AddSingle,
        Operation::AddBatch,
        Operation::GetAll,
        Operation::GetById,
        Operation::GetByTag,
        Operation::GetByField,
        Operation::GetWithinTimeFrame,
    ];

    /// Queue the operation consumes from
    pub fn queue(&self) -> &'static str {
        match self {
            Operation::AddSingle => "add-single-requests",
            Operation::AddBatch => "add-batch-requests",
            Operation::GetAll => "get-all-requests",
            Operation::GetById => "get-by-id-requests",
            Operation::GetByTag => "get-by-tag-requests",
            Operation::GetByField => "get-by-field-requests",
            Operation::GetWithinTimeFrame => "get-within-timeframe-requests",
        }
    }

    /// Routing key the queue is bound with
    pub fn routing_key(&self) -> &'static str {
        match self {
            Operation::AddSingle => "add-single-route",
            Operation::AddBatch => "add-batch-route",
            Operation::GetAll => "get-all-route",
            Operation::GetById => "get-by-id-route",
            Operation::GetByTag => "get-by-tag-route",
            Operation::GetByField => "get-by-field-route",
            Operation::GetWithinTimeFrame => "get-within-timeframe-route",
        }
    }

    /// Short name used for connection and consumer tags
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddSingle => "add-single",
            Operation::AddBatch => "add-batch",
            Operation::GetAll => "get-all",
            Operation::GetById => "get-by-id",
            Operation::GetByTag => "get-by-tag",
            Operation::GetByField => "get-by-field",
            Operation::GetWithinTimeFrame => "get-within-timeframe",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_queues_and_routing_keys_are_distinct() {
        let queues: HashSet<_> = Operation::ALL.iter().map(Operation::queue).collect();
        let routes: HashSet<_> = Operation::ALL.iter().map(Operation::routing_key).collect();
        assert_eq!(queues.len(), Operation::ALL.len());
        assert_eq!(routes.len(), Operation::ALL.len());
    }

    #[test]
    fn test_names_derive_queue_and_route() {
        for operation in Operation::ALL {
            assert_eq!(format!("{}-requests", operation.name()), operation.queue());
            assert_eq!(format!("{}-route", operation.name()), operation.routing_key());
        }
    }
}
