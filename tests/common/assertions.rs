//! Custom assertion macros and utilities
//!
//! Provides assertion macros with more descriptive failure output than a
//! bare `unwrap()`.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Poll an async condition until it holds or the timeout elapses
#[macro_export]
macro_rules! wait_until {
    ($timeout:expr, $cond:expr) => {{
        let deadline = tokio::time::Instant::now() + $timeout;
        loop {
            if $cond {
                break true;
            }
            if tokio::time::Instant::now() >= deadline {
                break false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }};
}
