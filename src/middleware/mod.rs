/*
 * Responsibility
 * - middleware の公開インターフェース
 */
pub mod dpop_auth;
pub mod http;
