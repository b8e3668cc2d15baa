use axum::Router;

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn serve(app: Router) -> String {
    serve_with(|_| app).await
}

/// Like [`serve`], for routers that need to know their own base URL
pub async fn serve_with(build: impl FnOnce(&str) -> Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(&base);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    base
}
