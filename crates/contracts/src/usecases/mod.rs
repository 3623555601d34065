pub mod u508_price_calculator;
