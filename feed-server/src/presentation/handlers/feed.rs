use crate::application::feed_service::FeedService;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{FeedItem, FeedResponse, parse_page_param};
use crate::presentation::session::SessionIdentity;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, web};
use tracing::info;

type Service = FeedService<PostgresPostRepository, PostgresUserRepository>;

#[get("/feed")]
pub async fn feed(
    req: HttpRequest,
    session: SessionIdentity,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let page = parse_page_param(req.query_string())?;
    let feed = service.feed(session.email(), page).await?;

    info!(
        request_id = %request_id(&req),
        page = page.get(),
        total_pages = feed.total_pages,
        items = feed.posts.len(),
        "feed page served"
    );

    Ok(HttpResponse::Ok().json(FeedResponse::from(feed)))
}

#[get("/posts/{id}")]
pub async fn post_detail(
    req: HttpRequest,
    session: SessionIdentity,
    service: web::Data<Service>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = service.post_detail(session.email(), post_id).await?;

    info!(
        request_id = %request_id(&req),
        post_id,
        "post served"
    );

    Ok(HttpResponse::Ok().json(FeedItem::from(post)))
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<crate::presentation::middleware::RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
