use crate::api::assignment::{AssignUser, CreateAssignment};
use crate::api::attendance::{Alert, AlertType, Analytics, AttendanceSummary, Severity, UserStats};
use crate::api::clock::{BreakResponse, ClockPayload, ClockResponse, StatusResponse};
use crate::api::employee::{CreateEmployee, UpdateEmployee};
use crate::api::health::HealthResponse;
use crate::api::location::{CreateLocation, UpdateLocation};
use crate::api::settings::{TenantSettings, UpdateSettings};
use crate::api::shift::{BulkShiftRequest, BulkShiftResponse};
use crate::auth::auth::Profile;
use crate::model::assignment::AssignmentResponse;
use crate::model::attendance::{AttendanceResponse, AttendanceStatus, BreakRecord};
use crate::model::location::{Location, LocationBrief};
use crate::model::role::Role;
use crate::model::shift::ShiftResponse;
use crate::model::user::{UserBrief, UserResponse};
use crate::models::{
    BootstrapReq, CreateAdminReq, CreatedAdmin, CreatedAdminResponse, ForgotPasswordReq,
    ForgotPasswordResponse, LoginReqDto, OkResponse, ResetPasswordReq,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GeoAttend API",
        version = "1.0.0",
        description = r#"
## GeoAttend

Multi-tenant attendance tracking with GPS geofencing.

### Key Features
- **Employees** clock in and out only inside an assigned location's geofence,
  optionally with a photo, and can take breaks.
- **Admins** manage employees, locations, assignments and weekly shifts, and
  get attendance reports, analytics, CSV export and alerts.

### Security
Endpoints other than health and the auth routes require the `ga_session`
cookie set by `POST /api/auth/login`. Everything under `/api/admin` is
restricted to the ADMIN role. Data is always scoped to the caller's tenant.

### Response Format
JSON with camelCase keys; errors are `{"error": "<message>"}`.
"#,
    ),
    paths(
        crate::api::health::health,

        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::forgot_password,
        crate::auth::handlers::reset_password,
        crate::auth::handlers::bootstrap,
        crate::auth::handlers::create_admin_open,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,
        crate::api::employee::employee_locations,

        crate::api::location::list_locations,
        crate::api::location::get_location,
        crate::api::location::create_location,
        crate::api::location::update_location,
        crate::api::location::delete_location,

        crate::api::assignment::list_assignments,
        crate::api::assignment::create_assignment,
        crate::api::assignment::delete_assignment,
        crate::api::assignment::location_assignments,
        crate::api::assignment::assign_to_location,

        crate::api::shift::list_shifts,
        crate::api::shift::bulk_create_shifts,
        crate::api::shift::delete_shift,

        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_summary,
        crate::api::attendance::analytics,
        crate::api::attendance::live,
        crate::api::attendance::export_csv,
        crate::api::attendance::recalculate,
        crate::api::attendance::alerts,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,
        crate::api::settings::upload_logo,

        crate::api::clock::my_attendance,
        crate::api::clock::status,
        crate::api::clock::my_locations,
        crate::api::clock::clock_in,
        crate::api::clock::clock_out,
        crate::api::clock::break_start,
        crate::api::clock::break_end
    ),
    components(
        schemas(
            HealthResponse,
            Profile,
            Role,
            LoginReqDto,
            ForgotPasswordReq,
            ForgotPasswordResponse,
            ResetPasswordReq,
            BootstrapReq,
            CreateAdminReq,
            CreatedAdmin,
            CreatedAdminResponse,
            OkResponse,
            UserResponse,
            UserBrief,
            CreateEmployee,
            UpdateEmployee,
            Location,
            LocationBrief,
            CreateLocation,
            UpdateLocation,
            AssignmentResponse,
            CreateAssignment,
            AssignUser,
            ShiftResponse,
            BulkShiftRequest,
            BulkShiftResponse,
            AttendanceStatus,
            AttendanceResponse,
            AttendanceSummary,
            UserStats,
            Analytics,
            AlertType,
            Severity,
            Alert,
            BreakRecord,
            TenantSettings,
            UpdateSettings,
            ClockPayload,
            ClockResponse,
            StatusResponse,
            BreakResponse
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Login, sessions, password reset and bootstrap"),
        (name = "Employees", description = "Admin user management"),
        (name = "Locations", description = "Geofenced work locations"),
        (name = "Assignments", description = "Which employee may clock in where"),
        (name = "Shifts", description = "Weekly expected work windows"),
        (name = "Reports", description = "Attendance reports, analytics, export and alerts"),
        (name = "Settings", description = "Tenant name, address and logo"),
        (name = "Employee", description = "Self-service clocking and breaks"),
    )
)]
pub struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("ga_session"))),
        );
    }
}
