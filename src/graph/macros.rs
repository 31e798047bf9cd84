//! `cypher!` shorthand for parameterized queries.

/// Build a [`Query`](crate::graph::Query) with named parameters.
///
/// ```ignore
/// use ontodeps::cypher;
///
/// let rows = cypher!(
///     graph,
///     "MATCH (m:Microtheory {slug: $slug}) RETURN m.id AS id",
///     slug = "baseline",
/// )
/// .fetch_all()
/// .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value))+
    };
}
