/// Mid-range default on the normalized cosine-distance scale.
pub const DEFAULT_MAX_DISTANCE: f32 = 0.6;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Which retrieval strategy handles a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalRoute {
    Sql,
    Vector,
}

/// A routed question, ready to hand to a tool. Built per request and dropped
/// with the response; retrieval parameters are filled with defaults when the
/// caller leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalRequest {
    SqlQuery {
        question: String,
    },
    VectorQuery {
        question: String,
        max_distance: f32,
        limit: i64,
    },
}

impl RetrievalRequest {
    pub fn for_route(
        route: RetrievalRoute,
        question: String,
        max_distance: Option<f32>,
        limit: Option<i64>,
    ) -> Self {
        match route {
            RetrievalRoute::Sql => RetrievalRequest::SqlQuery { question },
            RetrievalRoute::Vector => RetrievalRequest::VectorQuery {
                question,
                max_distance: max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
                limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            },
        }
    }

    pub fn question(&self) -> &str {
        match self {
            RetrievalRequest::SqlQuery { question } => question,
            RetrievalRequest::VectorQuery { question, .. } => question,
        }
    }

    pub fn route(&self) -> RetrievalRoute {
        match self {
            RetrievalRequest::SqlQuery { .. } => RetrievalRoute::Sql,
            RetrievalRequest::VectorQuery { .. } => RetrievalRoute::Vector,
        }
    }
}

/// Lifecycle of a single question through the dispatcher. One-shot: a routed
/// question either answers or fails, with no re-routing to the other tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Unrouted,
    RoutedSql,
    RoutedVector,
    Answered,
    Failed,
}

impl RouteState {
    pub fn routed(route: RetrievalRoute) -> Self {
        match route {
            RetrievalRoute::Sql => RouteState::RoutedSql,
            RetrievalRoute::Vector => RouteState::RoutedVector,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteState::Answered | RouteState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_request_fills_defaults() {
        let request = RetrievalRequest::for_route(
            RetrievalRoute::Vector,
            "similar invoices".to_string(),
            None,
            None,
        );

        match request {
            RetrievalRequest::VectorQuery {
                max_distance,
                limit,
                ..
            } => {
                assert_eq!(max_distance, DEFAULT_MAX_DISTANCE);
                assert_eq!(limit, DEFAULT_PAGE_LIMIT);
            }
            other => panic!("expected vector query, got {:?}", other),
        }
    }

    #[test]
    fn explicit_parameters_are_kept() {
        let request = RetrievalRequest::for_route(
            RetrievalRoute::Vector,
            "q".to_string(),
            Some(0.3),
            Some(25),
        );

        assert_eq!(
            request,
            RetrievalRequest::VectorQuery {
                question: "q".to_string(),
                max_distance: 0.3,
                limit: 25,
            }
        );
    }

    #[test]
    fn sql_request_ignores_retrieval_parameters() {
        let request =
            RetrievalRequest::for_route(RetrievalRoute::Sql, "total sales".to_string(), Some(0.1), Some(5));

        assert_eq!(request.route(), RetrievalRoute::Sql);
        assert_eq!(request.question(), "total sales");
    }

    #[test]
    fn route_states() {
        assert_eq!(RouteState::routed(RetrievalRoute::Sql), RouteState::RoutedSql);
        assert_eq!(
            RouteState::routed(RetrievalRoute::Vector),
            RouteState::RoutedVector
        );
        assert!(RouteState::Answered.is_terminal());
        assert!(RouteState::Failed.is_terminal());
        assert!(!RouteState::RoutedSql.is_terminal());
    }
}
