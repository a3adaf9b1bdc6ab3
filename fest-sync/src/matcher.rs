//! Field-equality matchers
//!
//! A [`FieldMatcher`] compares one field of a local record with the
//! corresponding field of a remote value. A [`FieldMatchers`] list is the
//! structural-equality contract for a local/remote pair. Lists leave out
//! parent links and locally-owned fields so that changes to those never
//! count as "the remote changed this entity".

type CompareFn<L, R> = Box<dyn Fn(&L, &R) -> bool + Send + Sync>;

/// Optional-aware equality: both absent is equal, one absent is not
pub fn optional_eq<T: PartialEq + ?Sized>(local: Option<&T>, remote: Option<&T>) -> bool {
    match (local, remote) {
        (None, None) => true,
        (Some(local), Some(remote)) => local == remote,
        _ => false,
    }
}

/// Named comparison of one field pair
pub struct FieldMatcher<L, R> {
    name: &'static str,
    compare: CompareFn<L, R>,
}

impl<L: 'static, R: 'static> FieldMatcher<L, R> {
    /// Matcher from a literal comparison
    pub fn from_fn<F>(name: &'static str, compare: F) -> Self
    where
        F: Fn(&L, &R) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            compare: Box::new(compare),
        }
    }

    /// Both sides always present
    pub fn field<T, FL, FR>(name: &'static str, local: FL, remote: FR) -> Self
    where
        T: PartialEq + ?Sized,
        FL: Fn(&L) -> &T + Send + Sync + 'static,
        FR: Fn(&R) -> &T + Send + Sync + 'static,
    {
        Self::from_fn(name, move |l, r| local(l) == remote(r))
    }

    /// Both sides optional
    pub fn optional<T, FL, FR>(name: &'static str, local: FL, remote: FR) -> Self
    where
        T: PartialEq + ?Sized,
        FL: Fn(&L) -> Option<&T> + Send + Sync + 'static,
        FR: Fn(&R) -> Option<&T> + Send + Sync + 'static,
    {
        Self::from_fn(name, move |l, r| optional_eq(local(l), remote(r)))
    }

    /// Optional on the local side only
    pub fn local_optional<T, FL, FR>(name: &'static str, local: FL, remote: FR) -> Self
    where
        T: PartialEq + ?Sized,
        FL: Fn(&L) -> Option<&T> + Send + Sync + 'static,
        FR: Fn(&R) -> &T + Send + Sync + 'static,
    {
        Self::from_fn(name, move |l, r| optional_eq(local(l), Some(remote(r))))
    }

    /// Optional on the remote side only
    pub fn remote_optional<T, FL, FR>(name: &'static str, local: FL, remote: FR) -> Self
    where
        T: PartialEq + ?Sized,
        FL: Fn(&L) -> &T + Send + Sync + 'static,
        FR: Fn(&R) -> Option<&T> + Send + Sync + 'static,
    {
        Self::from_fn(name, move |l, r| optional_eq(Some(local(l)), remote(r)))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, local: &L, remote: &R) -> bool {
        (self.compare)(local, remote)
    }
}

/// Ordered list of matchers for one entity kind
pub struct FieldMatchers<L, R> {
    matchers: Vec<FieldMatcher<L, R>>,
}

impl<L: 'static, R: 'static> FieldMatchers<L, R> {
    pub fn new(matchers: Vec<FieldMatcher<L, R>>) -> Self {
        Self { matchers }
    }

    /// Conjunction of every matcher
    pub fn all_match(&self, local: &L, remote: &R) -> bool {
        self.matchers.iter().all(|m| m.matches(local, remote))
    }

    /// Names of the fields that differ, in list order
    pub fn mismatched(&self, local: &L, remote: &R) -> Vec<&'static str> {
        self.matchers
            .iter()
            .filter(|m| !m.matches(local, remote))
            .map(FieldMatcher::name)
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(FieldMatcher::name).collect()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
