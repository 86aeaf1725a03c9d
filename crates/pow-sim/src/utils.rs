//! Helper functions and data types

/// Helper for storing idempotent closures/functions with one argument
#[derive(Clone)]
pub struct WrapFunc<Input, Output> {
    name: String,
    func: std::sync::Arc<dyn Fn(Input) -> Output + Send + Sync + 'static>,
}

/// Creates a [`WrapFunc`] from a name and a closure.
macro_rules! wrap {
    ($name:expr, $func:expr) => {
        $crate::utils::WrapFunc::new($name, $func)
    };
}

pub(crate) use wrap;

impl<I, J> WrapFunc<I, J> {
    pub fn new<N, F>(name: N, func: F) -> Self
    where
        N: Into<String>,
        F: Fn(I) -> J + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: std::sync::Arc::new(func),
        }
    }

    pub fn call(&self, input: I) -> J {
        self.func.as_ref()(input)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<I, J> std::fmt::Debug for WrapFunc<I, J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<WrapFunc: {}>", self.name)
    }
}

impl<I, J> PartialEq for WrapFunc<I, J> {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq(&other.name)
    }
}

impl<I, J> Eq for WrapFunc<I, J> {}

impl<I, J> PartialOrd for WrapFunc<I, J> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, J> Ord for WrapFunc<I, J> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl<I, J> std::hash::Hash for WrapFunc<I, J> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Returns the median of `values`, averaging the two middle values when the
/// length is even.
///
/// ## Panics
/// Panics if `values` is empty.
pub fn median_of_floats(mut values: Vec<f64>) -> f64 {
    assert!(!values.is_empty(), "median of an empty set");

    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
