//! Declarative model definitions
//!
//! ```
//! use wp_orm::model;
//!
//! model! {
//!     /// A WordPress page
//!     pub struct Page => post("page");
//! }
//!
//! model! {
//!     pub struct Category => term("category");
//! }
//!
//! model! {
//!     pub struct Booking => table("bookings", "id");
//! }
//! ```
//!
//! A trailing block adds items to the generated [`Model`](crate::Model) impl,
//! such as `boot`, `initialize` or `doing`.

/// Define a model struct and its [`Model`](crate::Model) impl for a post type,
/// a taxonomy or a plain table
#[macro_export]
macro_rules! model {
    (@struct $(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            state: $crate::model::ModelState,
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let json = $crate::model::ModelExtensions::to_json(self).map_err(|_| ::std::fmt::Error)?;
                f.write_str(&json)
            }
        }
    };

    (@state) => {
        fn from_state(state: $crate::model::ModelState) -> Self {
            Self { state }
        }

        fn state(&self) -> &$crate::model::ModelState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut $crate::model::ModelState {
            &mut self.state
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => post($post_type:literal) $({ $($body:tt)* })? $(;)?
    ) => {
        $crate::model!(@struct $(#[$meta])* $vis $name);

        impl $crate::model::Model for $name {
            const OBJECT_TYPE: &'static str = $post_type;
            const TABLE: &'static str = "posts";
            const PRIMARY_KEY: &'static str = "ID";

            $crate::model!(@state);

            fn new_query(ctx: &$crate::Context) -> ::std::boxed::Box<dyn $crate::query::Query> {
                let vars = $crate::query::QueryVars::new().with_var("post_type", $post_type);
                ::std::boxed::Box::new(
                    $crate::query::PostQuery::new(ctx.posts().clone(), vars)
                        .with_trash(ctx.config().trash_enabled()),
                )
            }

            $($($body)*)?
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => term($taxonomy:literal) $({ $($body:tt)* })? $(;)?
    ) => {
        $crate::model!(@struct $(#[$meta])* $vis $name);

        impl $crate::model::Model for $name {
            const OBJECT_TYPE: &'static str = $taxonomy;
            const TABLE: &'static str = "terms";
            const PRIMARY_KEY: &'static str = "term_id";

            $crate::model!(@state);

            fn new_query(ctx: &$crate::Context) -> ::std::boxed::Box<dyn $crate::query::Query> {
                let vars = $crate::query::QueryVars::new().with_var("taxonomy", $taxonomy);
                ::std::boxed::Box::new($crate::query::TermQuery::new(ctx.terms().clone(), vars))
            }

            fn meta_type(&self) -> &'static str {
                "term"
            }

            $($($body)*)?
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => table($table:literal, $key:literal) $({ $($body:tt)* })? $(;)?
    ) => {
        $crate::model!(@struct $(#[$meta])* $vis $name);

        impl $crate::model::Model for $name {
            const OBJECT_TYPE: &'static str = $table;
            const TABLE: &'static str = $table;
            const PRIMARY_KEY: &'static str = $key;

            $crate::model!(@state);

            $($($body)*)?
        }
    };
}
