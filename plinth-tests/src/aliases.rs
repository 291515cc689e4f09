use crate::silent_logs;
use plinth::{Connection, Error, Registry};
use std::sync::Arc;

pub async fn aliases<C: Connection>(registry: &Registry<C>) {
    assert!(!registry.is_connected("replica").await);
    let replica = registry
        .instance("replica")
        .await
        .expect("Could not connect through the alias chain");
    assert_eq!(replica.name(), "replica");
    assert_eq!(replica.db(), "plinth_tests");
    assert!(registry.is_connected("replica").await);
    let again = registry
        .instance("replica")
        .await
        .expect("Could not get the replica again");
    assert!(Arc::ptr_eq(&replica, &again));

    let main = registry
        .instance("main")
        .await
        .expect("Could not connect the main alias");
    assert!(!Arc::ptr_eq(&replica, &main));

    silent_logs! {
        let error = registry
            .instance("missing")
            .await
            .err()
            .expect("An unknown alias must not connect");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Configuration(..))
        ));

        let error = registry
            .instance("loop_a")
            .await
            .err()
            .expect("A cyclic alias chain must not connect");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Configuration(..))
        ));
    }
    assert!(!registry.is_connected("missing").await);
}
