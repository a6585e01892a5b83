/// 인증 게이트웨이가 검증을 마친 뒤 전달하는 신원 헤더 추출
/// 토큰 검증은 외부 인증 제공자의 책임이며 여기서는 헤더를 신뢰한다.
// region:    --- Imports
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
// endregion: --- Imports

// region:    --- Auth User

/// 요청을 보낸 사용자의 신원(x-user-id, x-user-role 헤더)
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "SUPERADMIN"
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        let Some(id) = id else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "인증 정보가 없습니다.",
                    "code": "UNAUTHORIZED"
                })),
            ));
        };

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("USER")
            .to_string();

        Ok(AuthUser { id, role })
    }
}

// endregion: --- Auth User
