//! Assertion macros shared by the integration and property tests
//!
//! - `assert_ok!` unwraps a `Result` and reports the error on failure
//! - `assert_err!` checks for an error, optionally matching a `FeedError`
//!   variant pattern
//! - `assert_liked!` looks a post up in a `FeedWindow` by id and checks
//!   whether a user is in its likes (`not` for the inverse), printing the
//!   like set on failure

/// Assert that a result is ok and return the value
///
/// This macro unwraps a Result, providing a better error message
/// if the result is an error.
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

/// Assert that a result is an error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert that a post in a window is (or is not) liked by a user
#[macro_export]
macro_rules! assert_liked {
    ($window:expr, $post:expr, $user:expr) => {
        let post = $window
            .get(&pixfeed::shared::PostId::new($post))
            .unwrap_or_else(|| panic!("post {} missing from window", $post));
        assert!(
            post.is_liked_by(&pixfeed::shared::UserId::new($user)),
            "Expected {} to like {}, likes: {:?}",
            $user,
            $post,
            post.likes
        );
    };
    ($window:expr, $post:expr, $user:expr, not) => {
        let post = $window
            .get(&pixfeed::shared::PostId::new($post))
            .unwrap_or_else(|| panic!("post {} missing from window", $post));
        assert!(
            !post.is_liked_by(&pixfeed::shared::UserId::new($user)),
            "Expected {} not to like {}, likes: {:?}",
            $user,
            $post,
            post.likes
        );
    };
}
