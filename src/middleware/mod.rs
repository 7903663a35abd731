pub mod auth;
pub mod permission;

pub use auth::AuthenticationGate;
pub use permission::{RequirePermission, RequireRole};

#[cfg(test)]
pub(crate) mod test_harness {
    use actix_web::body::{BoxBody, MessageBody};
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::{test, Error};

    /// Like `test::call_service`, but materializes a rejection (`Err`
    /// from the middleware chain) into the HTTP error response the real
    /// server would send, so tests can assert on its status.
    pub(crate) async fn call_service<S, R, B>(app: &S, req: R) -> ServiceResponse<BoxBody>
    where
        S: Service<R, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody + 'static,
    {
        match test::try_call_service(app, req).await {
            Ok(res) => res.map_into_boxed_body(),
            Err(err) => ServiceResponse::new(
                test::TestRequest::default().to_http_request(),
                err.error_response(),
            ),
        }
    }
}
