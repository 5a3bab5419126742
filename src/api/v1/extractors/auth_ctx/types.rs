/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークンの抽出・検証は middleware/services 側の責務
 * - claims は provider が返したものをそのまま保持する（再整形しない）
 */
use crate::services::identity::DecodedClaims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - リクエストごとに新しく作られ、extensions 経由で handler に渡る
/// - 生成後は不変。リクエスト終了とともに破棄される
#[derive(Debug, Clone)]
pub struct AuthCtx {
    claims: DecodedClaims,
}

impl AuthCtx {
    pub fn new(claims: DecodedClaims) -> Self {
        Self { claims }
    }

    /// Provider-assigned subject id.
    pub fn uid(&self) -> &str {
        &self.claims.sub
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref()
    }

    pub fn is_super_admin(&self) -> bool {
        self.claims.is_super_admin()
    }
}
