mod client;
mod helpers;
mod routes;
