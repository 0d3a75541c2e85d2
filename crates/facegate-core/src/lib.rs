pub mod errors;
pub mod faces;
pub mod login;
pub mod session;

pub use errors::{AppError, AppResult};
pub use login::{run_face_login_with, FaceLoginOutcome};
pub use session::{
    resolve_session_secret, JwtSessionIssuer, SessionClaims, SessionCredential, SessionIssuer,
    MIN_SESSION_SECRET_LEN, SESSION_SECRET_ENV,
};
