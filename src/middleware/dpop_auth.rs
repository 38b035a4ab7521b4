/*
 * Responsibility
 * - DPoP proof の検証 (ヘッダ抽出 → htu 組み立て → 検証 → 拒否)
 * - 成功時に、検証済み proof の情報 (ProofCtx) を request extensions に載せる
 * - replay 対策 (jti の保存) はここではやらない。必要なら ProofCtx.jti を使って上に積む
 */
use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, Uri, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::warn;

use crate::api::v1::extractors::ProofCtx;
use crate::error::AppError;
use crate::state::AppState;

const DPOP_HEADER: &str = "dpop";

/// `router` 配下のルートに DPoP 検証を掛ける。
///
/// ```ignore
/// let protected = Router::new().route("/proof", get(show_proof));
/// let protected = middleware::dpop_auth::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, dpop_middleware))
}

async fn dpop_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let proof = single_proof(req.headers())?;
    let access_token = dpop_access_token(req.headers());
    // nest() strips the prefix from req.uri(); htu is the URL the client saw.
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| req.uri().clone());
    let request_url = build_request_url(req.headers(), &uri, state.public_base_url());

    let ctx = state
        .dpop
        .context(req.method().as_str(), &request_url, access_token.as_deref());

    let verified = match state.dpop.verify(&proof, &ctx) {
        Ok(verified) => verified,
        Err(err) => {
            warn!(
                code = err.code(),
                error = %err,
                htu = %request_url,
                "dpop verification failed"
            );
            return Err(AppError::from(err));
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(ProofCtx::from(verified));

    Ok(next.run(req).await)
}

// RFC 9449: exactly one DPoP header field.
fn single_proof(headers: &HeaderMap) -> Result<String, AppError> {
    let mut values = headers.get_all(DPOP_HEADER).iter();
    match (values.next(), values.next()) {
        (Some(value), None) => value
            .to_str()
            .map(str::to_owned)
            .map_err(|_| AppError::MissingDpopProof),
        _ => Err(AppError::MissingDpopProof),
    }
}

/// `Authorization: DPoP <token>`. Other schemes do not bind a token.
fn dpop_access_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("DPoP") && !token.is_empty()).then(|| token.to_owned())
}

/// Absolute URL of the incoming request, as the client addressed it.
pub fn build_request_url(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url {
        match build_url_from_base(base, uri) {
            Ok(url) => return url,
            // Config validates PUBLIC_BASE_URL, so this is a programming error; fall back.
            Err(e) => warn!(error = %e, base, "unusable public base url"),
        }
    }
    build_url_from_forwarded(headers, uri)
}

fn build_url_from_base(base: &str, uri: &Uri) -> Result<String, url::ParseError> {
    // `base` should be like: https://api.example.com
    let mut url = url::Url::parse(base)?;

    // Overwrite path/query from the incoming request target.
    url.set_path(uri.path());
    url.set_query(uri.query());

    Ok(url.to_string())
}

fn build_url_from_forwarded(headers: &HeaderMap, uri: &Uri) -> String {
    // Prefer proxy headers when present.
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}://{}{}", scheme, host, path_and_query)
}
