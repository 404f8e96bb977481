#![cfg(feature = "integration-tests")]

mod integration {
    mod bindings_test;
    mod test_utils;
}
