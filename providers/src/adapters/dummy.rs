//! Minimal adapter doubles.

use crate::family::Family;
use crate::provider::Provider;
use crate::Record;

/// An adapter that only serves `getOne`, always answering with `response`.
/// Every other operation is left unimplemented.
pub fn only_get_one<F: Family>(response: Record) -> Provider<F> {
    Provider::new().with_get_one(move |_, _| F::ready(Ok(response.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Immediate, Suspend};
    use crate::Operation;
    use serde_json::json;

    #[test]
    fn serves_get_one_only() {
        let provider = only_get_one::<Immediate>(json!({"fakeResponse": true}));
        assert_eq!(provider.capabilities(), vec![Operation::GetOne]);
        let get_one = provider.get_one.as_ref().unwrap();
        assert_eq!(
            get_one(Default::default(), Default::default()).unwrap(),
            json!({"fakeResponse": true})
        );
    }

    #[tokio::test]
    async fn async_variant_answers_through_a_future() {
        let provider = only_get_one::<Suspend>(json!({"fakeResponse": true}));
        let get_one = provider.get_one.as_ref().unwrap();
        let response = get_one(Default::default(), Default::default()).await.unwrap();
        assert_eq!(response, json!({"fakeResponse": true}));
    }
}
