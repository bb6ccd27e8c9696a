mod client;

pub use client::{GraphQLResponse, HttpClient};
