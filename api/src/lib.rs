// HTTP layer of the job board: router, state, middleware, handlers

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
