//! Business logic services for the back office

pub mod attendance;
pub mod auth;
pub mod category;
pub mod company;
pub mod customer;
pub mod dashboard;
pub mod employee;
pub mod invoice;
pub mod movement;
pub mod notification;
pub mod order;
pub mod payroll;
pub mod product;
pub mod returns;
pub mod sale;
pub mod setting;
pub mod stock_monitor;
pub mod supplier;
pub mod user;
pub mod vacation;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use category::CategoryService;
pub use company::CompanyService;
pub use customer::CustomerService;
pub use dashboard::DashboardService;
pub use employee::EmployeeService;
pub use invoice::InvoiceService;
pub use movement::{spawn_movement_recorder, MovementService};
pub use notification::NotificationService;
pub use order::OrderService;
pub use payroll::PayrollService;
pub use product::ProductService;
pub use returns::ReturnService;
pub use sale::SaleService;
pub use setting::SettingService;
pub use stock_monitor::{spawn_stock_monitor, StockMonitor};
pub use supplier::SupplierService;
pub use user::UserService;
pub use vacation::VacationService;
