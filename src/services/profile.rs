use crate::models::StudentProfile;
use crate::state::ServiceContext;

pub fn get(ctx: &ServiceContext) -> Result<StudentProfile, String> {
    ctx.db.get_profile().map_err(|e| e.to_string())
}

pub fn update(ctx: &ServiceContext, profile: &StudentProfile) -> Result<(), String> {
    ctx.db.update_profile(profile).map_err(|e| e.to_string())
}
