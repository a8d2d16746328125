/// Cookie session key holding the id of the signed-in user.
pub const USER_ID: &str = "user_id";
