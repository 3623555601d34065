pub mod wildberries;
